//! Repository trait for schedule persistence.
//!
//! The orchestrator depends on [`ScheduleRepository`] only, so tests can run
//! it against the in-memory mock below instead of PostgreSQL.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_default_timeout, with_timeout};
use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::{
    ExclusionPair, FixtureKey, GeneratedFixture, GroupStandings, HalfScore, MatchResult, Stage,
    Team, TieBreakReason, TournamentConfig, TournamentId, TournamentInfo,
};

/// Trait for tournament schedule storage
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Load a tournament and its configuration
    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Option<TournamentInfo>>;

    /// Load the roster
    async fn list_teams(&self, tournament_id: TournamentId) -> ScheduleResult<Vec<Team>>;

    /// Load results of fixtures in the given stages, keyed by fixture
    async fn list_results(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
    ) -> ScheduleResult<Vec<(FixtureKey, MatchResult)>>;

    /// Load preliminary exclusion pairs
    async fn list_exclusions(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Vec<ExclusionPair>>;

    /// Load generated fixtures in the given stages
    async fn list_fixtures(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
    ) -> ScheduleResult<Vec<GeneratedFixture>>;

    /// Overwrite all stored standings of a tournament
    async fn replace_standings(
        &self,
        tournament_id: TournamentId,
        standings: &[GroupStandings],
    ) -> ScheduleResult<()>;

    /// Delete every fixture in `stages`, together with the results recorded
    /// against them, and insert `fixtures` as one unit. Returns the number of
    /// deleted fixtures.
    async fn replace_fixtures(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
        fixtures: &[GeneratedFixture],
    ) -> ScheduleResult<u64>;

    /// Overwrite the participants of one stored fixture
    async fn update_fixture(
        &self,
        tournament_id: TournamentId,
        fixture: &GeneratedFixture,
    ) -> ScheduleResult<()>;
}

/// PostgreSQL implementation of [`ScheduleRepository`]
pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn stage_names(stages: &[Stage]) -> Vec<String> {
    stages.iter().map(|s| s.as_str().to_string()).collect()
}

fn decode_stage(row: &PgRow) -> Result<Stage, sqlx::Error> {
    let name: String = row.try_get("stage")?;
    name.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

fn decode_fixture(row: &PgRow) -> ScheduleResult<GeneratedFixture> {
    Ok(GeneratedFixture {
        stage: decode_stage(row)?,
        number: row.get::<i32, _>("number") as u32,
        group: row.get("group_label"),
        venue: row.get("venue"),
        kickoff: row.get("kickoff"),
        home: serde_json::from_value(row.get("home"))?,
        away: serde_json::from_value(row.get("away"))?,
        rematch: row.get("rematch"),
    })
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Option<TournamentInfo>> {
        let row = with_default_timeout(
            sqlx::query("SELECT id, name, config FROM tournaments WHERE id = $1")
                .bind(tournament_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => {
                let config: TournamentConfig = serde_json::from_value(row.get("config"))?;
                Ok(Some(TournamentInfo {
                    id: row.get("id"),
                    name: row.get("name"),
                    config,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_teams(&self, tournament_id: TournamentId) -> ScheduleResult<Vec<Team>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, name, group_label, slot FROM teams
                 WHERE tournament_id = $1
                 ORDER BY group_label, slot, id",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Team {
                id: row.get("id"),
                name: row.get("name"),
                group: row.get("group_label"),
                slot: row.get::<i32, _>("slot") as u32,
            })
            .collect())
    }

    async fn list_results(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
    ) -> ScheduleResult<Vec<(FixtureKey, MatchResult)>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT stage, number, home_team, away_team,
                       home_first_half, home_second_half, away_first_half, away_second_half,
                       home_penalties, away_penalties, completed
                FROM match_results
                WHERE tournament_id = $1 AND stage = ANY($2)
                ORDER BY stage, number
                "#,
            )
            .bind(tournament_id)
            .bind(stage_names(stages))
            .fetch_all(&self.pool),
        )
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let key = FixtureKey::new(decode_stage(&row)?, row.get::<i32, _>("number") as u32);
            let penalties = match (
                row.get::<Option<i32>, _>("home_penalties"),
                row.get::<Option<i32>, _>("away_penalties"),
            ) {
                (Some(h), Some(a)) => Some((h as u32, a as u32)),
                _ => None,
            };
            let result = MatchResult {
                home: row.get("home_team"),
                away: row.get("away_team"),
                home_goals: HalfScore::new(
                    row.get::<i32, _>("home_first_half") as u32,
                    row.get::<i32, _>("home_second_half") as u32,
                ),
                away_goals: HalfScore::new(
                    row.get::<i32, _>("away_first_half") as u32,
                    row.get::<i32, _>("away_second_half") as u32,
                ),
                penalties,
                completed: row.get("completed"),
            };
            results.push((key, result));
        }

        Ok(results)
    }

    async fn list_exclusions(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Vec<ExclusionPair>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT group_label, team_low, team_high FROM exclusion_pairs \
                 WHERE tournament_id = $1",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                ExclusionPair::new(
                    row.get::<String, _>("group_label"),
                    row.get("team_low"),
                    row.get("team_high"),
                )
            })
            .collect())
    }

    async fn list_fixtures(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
    ) -> ScheduleResult<Vec<GeneratedFixture>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT stage, number, group_label, venue, kickoff, home, away, rematch
                FROM fixtures
                WHERE tournament_id = $1 AND stage = ANY($2)
                ORDER BY kickoff, stage, number
                "#,
            )
            .bind(tournament_id)
            .bind(stage_names(stages))
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(decode_fixture).collect()
    }

    async fn replace_standings(
        &self,
        tournament_id: TournamentId,
        standings: &[GroupStandings],
    ) -> ScheduleResult<()> {
        let pool = &self.pool;
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, async move {
            let mut tx = pool.begin().await?;

            sqlx::query("DELETE FROM standings WHERE tournament_id = $1")
                .bind(tournament_id)
                .execute(&mut *tx)
                .await?;

            for row in standings.iter().flat_map(|g| g.rows.iter()) {
                sqlx::query(
                    r#"
                    INSERT INTO standings (tournament_id, group_label, team_id, rank, played, won,
                                           drawn, lost, goals_for, goals_against, tie_break)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#,
                )
                .bind(tournament_id)
                .bind(&row.group)
                .bind(row.team_id)
                .bind(row.rank as i32)
                .bind(row.played as i32)
                .bind(row.won as i32)
                .bind(row.drawn as i32)
                .bind(row.lost as i32)
                .bind(row.goals_for as i32)
                .bind(row.goals_against as i32)
                .bind(row.tie_break.map(|reason: TieBreakReason| reason.to_string()))
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await
        })
        .await
    }

    async fn replace_fixtures(
        &self,
        tournament_id: TournamentId,
        stages: &[Stage],
        fixtures: &[GeneratedFixture],
    ) -> ScheduleResult<u64> {
        let mut encoded = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            encoded.push((
                fixture,
                serde_json::to_value(fixture.home)?,
                serde_json::to_value(fixture.away)?,
            ));
        }

        let pool = &self.pool;
        let stages = stage_names(stages);
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, async move {
            let mut tx = pool.begin().await?;

            // Results are keyed by (stage, number), which the new fixtures reuse
            sqlx::query("DELETE FROM match_results WHERE tournament_id = $1 AND stage = ANY($2)")
                .bind(tournament_id)
                .bind(&stages)
                .execute(&mut *tx)
                .await?;

            let deleted =
                sqlx::query("DELETE FROM fixtures WHERE tournament_id = $1 AND stage = ANY($2)")
                    .bind(tournament_id)
                    .bind(&stages)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            for (fixture, home, away) in encoded {
                sqlx::query(
                    r#"
                    INSERT INTO fixtures (tournament_id, stage, number, group_label, venue,
                                          kickoff, home, away, rematch)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(tournament_id)
                .bind(fixture.stage.as_str())
                .bind(fixture.number as i32)
                .bind(&fixture.group)
                .bind(&fixture.venue)
                .bind(fixture.kickoff)
                .bind(home)
                .bind(away)
                .bind(fixture.rematch)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(deleted)
        })
        .await
    }

    async fn update_fixture(
        &self,
        tournament_id: TournamentId,
        fixture: &GeneratedFixture,
    ) -> ScheduleResult<()> {
        let home = serde_json::to_value(fixture.home)?;
        let away = serde_json::to_value(fixture.away)?;

        let result = with_default_timeout(
            sqlx::query(
                "UPDATE fixtures SET home = $1, away = $2
                 WHERE tournament_id = $3 AND stage = $4 AND number = $5",
            )
            .bind(home)
            .bind(away)
            .bind(tournament_id)
            .bind(fixture.stage.as_str())
            .bind(fixture.number as i32)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(ScheduleError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }
}

/// Mock implementation for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct State {
        tournaments: HashMap<TournamentId, TournamentInfo>,
        teams: HashMap<TournamentId, Vec<Team>>,
        results: HashMap<TournamentId, Vec<(FixtureKey, MatchResult)>>,
        exclusions: HashMap<TournamentId, Vec<ExclusionPair>>,
        fixtures: HashMap<TournamentId, Vec<GeneratedFixture>>,
        standings: HashMap<TournamentId, Vec<GroupStandings>>,
    }

    /// In-memory repository; clones share state
    #[derive(Clone, Default)]
    pub struct MockScheduleRepository {
        state: Arc<Mutex<State>>,
    }

    impl MockScheduleRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_tournament(self, info: TournamentInfo) -> Self {
            self.state.lock().unwrap().tournaments.insert(info.id, info);
            self
        }

        pub fn with_teams(self, tournament_id: TournamentId, teams: Vec<Team>) -> Self {
            self.state.lock().unwrap().teams.insert(tournament_id, teams);
            self
        }

        pub fn with_result(
            self,
            tournament_id: TournamentId,
            key: FixtureKey,
            result: MatchResult,
        ) -> Self {
            self.record_result(tournament_id, key, result);
            self
        }

        pub fn with_exclusion(self, tournament_id: TournamentId, pair: ExclusionPair) -> Self {
            self.state
                .lock()
                .unwrap()
                .exclusions
                .entry(tournament_id)
                .or_default()
                .push(pair);
            self
        }

        pub fn with_fixtures(
            self,
            tournament_id: TournamentId,
            fixtures: Vec<GeneratedFixture>,
        ) -> Self {
            self.state
                .lock()
                .unwrap()
                .fixtures
                .entry(tournament_id)
                .or_default()
                .extend(fixtures);
            self
        }

        /// Store a result, replacing any earlier result for the same fixture
        pub fn record_result(
            &self,
            tournament_id: TournamentId,
            key: FixtureKey,
            result: MatchResult,
        ) {
            let mut state = self.state.lock().unwrap();
            let results = state.results.entry(tournament_id).or_default();
            results.retain(|(k, _)| *k != key);
            results.push((key, result));
        }

        pub fn stored_fixtures(&self, tournament_id: TournamentId) -> Vec<GeneratedFixture> {
            self.state
                .lock()
                .unwrap()
                .fixtures
                .get(&tournament_id)
                .cloned()
                .unwrap_or_default()
        }

        pub fn stored_standings(&self, tournament_id: TournamentId) -> Vec<GroupStandings> {
            self.state
                .lock()
                .unwrap()
                .standings
                .get(&tournament_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ScheduleRepository for MockScheduleRepository {
        async fn find_tournament(
            &self,
            tournament_id: TournamentId,
        ) -> ScheduleResult<Option<TournamentInfo>> {
            Ok(self.state.lock().unwrap().tournaments.get(&tournament_id).cloned())
        }

        async fn list_teams(&self, tournament_id: TournamentId) -> ScheduleResult<Vec<Team>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .teams
                .get(&tournament_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_results(
            &self,
            tournament_id: TournamentId,
            stages: &[Stage],
        ) -> ScheduleResult<Vec<(FixtureKey, MatchResult)>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .results
                .get(&tournament_id)
                .map(|results| {
                    results
                        .iter()
                        .filter(|(key, _)| stages.contains(&key.stage))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn list_exclusions(
            &self,
            tournament_id: TournamentId,
        ) -> ScheduleResult<Vec<ExclusionPair>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .exclusions
                .get(&tournament_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_fixtures(
            &self,
            tournament_id: TournamentId,
            stages: &[Stage],
        ) -> ScheduleResult<Vec<GeneratedFixture>> {
            Ok(self
                .stored_fixtures(tournament_id)
                .into_iter()
                .filter(|f| stages.contains(&f.stage))
                .collect())
        }

        async fn replace_standings(
            &self,
            tournament_id: TournamentId,
            standings: &[GroupStandings],
        ) -> ScheduleResult<()> {
            self.state
                .lock()
                .unwrap()
                .standings
                .insert(tournament_id, standings.to_vec());
            Ok(())
        }

        async fn replace_fixtures(
            &self,
            tournament_id: TournamentId,
            stages: &[Stage],
            fixtures: &[GeneratedFixture],
        ) -> ScheduleResult<u64> {
            let mut state = self.state.lock().unwrap();
            if let Some(results) = state.results.get_mut(&tournament_id) {
                results.retain(|(key, _)| !stages.contains(&key.stage));
            }
            let stored = state.fixtures.entry(tournament_id).or_default();
            let before = stored.len();
            stored.retain(|f| !stages.contains(&f.stage));
            let deleted = (before - stored.len()) as u64;
            stored.extend(fixtures.iter().cloned());
            Ok(deleted)
        }

        async fn update_fixture(
            &self,
            tournament_id: TournamentId,
            fixture: &GeneratedFixture,
        ) -> ScheduleResult<()> {
            let mut state = self.state.lock().unwrap();
            let stored = state
                .fixtures
                .get_mut(&tournament_id)
                .and_then(|fixtures| fixtures.iter_mut().find(|f| f.key() == fixture.key()))
                .ok_or(ScheduleError::Database(sqlx::Error::RowNotFound))?;
            stored.home = fixture.home;
            stored.away = fixture.away;
            Ok(())
        }
    }

    mod tests {
        use super::*;
        use crate::models::Participant;
        use chrono::NaiveDate;

        fn fixture(stage: Stage, number: u32) -> GeneratedFixture {
            GeneratedFixture {
                stage,
                number,
                group: None,
                venue: "Pitch".to_string(),
                kickoff: NaiveDate::from_ymd_opt(2026, 5, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                home: Participant::Team(1),
                away: Participant::Team(2),
                rematch: false,
            }
        }

        #[tokio::test]
        async fn test_mock_replace_keeps_other_stages() {
            let repo = MockScheduleRepository::new().with_fixtures(
                1,
                vec![
                    fixture(Stage::Preliminary, 1),
                    fixture(Stage::Final, 1),
                    fixture(Stage::Training, 1),
                ],
            );

            let deleted = repo
                .replace_fixtures(1, &Stage::FINAL_DAY, &[fixture(Stage::Semifinal, 1)])
                .await
                .expect("replace should succeed");

            assert_eq!(deleted, 2);
            let stages: Vec<Stage> = repo.stored_fixtures(1).iter().map(|f| f.stage).collect();
            assert_eq!(stages, vec![Stage::Preliminary, Stage::Semifinal]);
        }

        #[tokio::test]
        async fn test_mock_replace_drops_results_of_replaced_stages() {
            let repo = MockScheduleRepository::new()
                .with_fixtures(1, vec![fixture(Stage::Preliminary, 1), fixture(Stage::Final, 1)])
                .with_result(
                    1,
                    FixtureKey::new(Stage::Preliminary, 1),
                    MatchResult::final_score(1, 2, 1, 0),
                )
                .with_result(
                    1,
                    FixtureKey::new(Stage::Final, 1),
                    MatchResult::final_score(1, 2, 0, 1),
                );

            repo.replace_fixtures(1, &Stage::FINAL_DAY, &[fixture(Stage::Final, 1)])
                .await
                .unwrap();

            let stages = [Stage::Preliminary, Stage::Final];
            let results = repo.list_results(1, &stages).await.unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].0, FixtureKey::new(Stage::Preliminary, 1));
        }

        #[tokio::test]
        async fn test_mock_record_result_replaces_correction() {
            let key = FixtureKey::new(Stage::Preliminary, 3);
            let repo = MockScheduleRepository::new()
                .with_result(1, key, MatchResult::final_score(1, 2, 0, 0));
            repo.record_result(1, key, MatchResult::final_score(1, 2, 1, 0));

            let results = repo.list_results(1, &[Stage::Preliminary]).await.unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].1.home_total(), 1);
        }

        #[tokio::test]
        async fn test_mock_update_missing_fixture_fails() {
            let repo = MockScheduleRepository::new();
            let err = repo.update_fixture(1, &fixture(Stage::Final, 1)).await.unwrap_err();
            assert!(matches!(err, ScheduleError::Database(sqlx::Error::RowNotFound)));
        }
    }
}

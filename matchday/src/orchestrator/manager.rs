//! Schedule manager driving the generators against a repository.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bracket::{generate_bracket, reconcile};
use crate::db::ScheduleRepository;
use crate::errors::{
    ConfigurationError, PreconditionError, ScheduleError, ScheduleResult, Warning,
};
use crate::models::{
    FixtureKey, GeneratedFixture, GroupStandings, MatchResult, Stage, TieBreakReason, TournamentId,
    TournamentInfo,
};
use crate::schedule::generate_preliminary_schedule;
use crate::standings::{group_labels, lottery_digest_hex, played_pairs, rank_groups};
use crate::training::pair_training_matches;

const BRACKET_STAGES: [Stage; 4] = [
    Stage::Quarterfinal,
    Stage::Semifinal,
    Stage::ThirdPlace,
    Stage::Final,
];

/// Result of a generation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Fixtures written by this run
    pub fixtures: Vec<GeneratedFixture>,
    /// Non-fatal problems found while generating
    pub warnings: Vec<Warning>,
    /// Fixtures removed before the new ones were written
    pub deleted: u64,
}

/// Schedule manager
#[derive(Clone)]
pub struct ScheduleManager {
    repository: Arc<dyn ScheduleRepository>,
}

impl ScheduleManager {
    /// Create a new schedule manager
    pub fn new(repository: Arc<dyn ScheduleRepository>) -> Self {
        Self { repository }
    }

    /// Regenerate every bracket and training fixture of the final day.
    ///
    /// Preliminary fixtures are never touched. Any earlier final-day
    /// fixtures are replaced in full, together with any results recorded
    /// against them, so running this twice is safe.
    pub async fn generate_final_day(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<GenerationReport> {
        let tournament = self.load_tournament(tournament_id).await?;
        let final_day = final_day(&tournament)?;

        let standings = self.rank(&tournament).await?;
        let played = played_pairs(&self.preliminary_results(tournament_id).await?);

        let mut warnings = group_count_warning(&tournament, standings.len());

        let bracket = generate_bracket(&standings, standings.len(), final_day, &tournament.config);
        let training = pair_training_matches(&standings, &played, final_day, &tournament.config);

        let mut fixtures = bracket.fixtures;
        fixtures.extend(training.fixtures);
        warnings.extend(bracket.warnings);
        warnings.extend(training.warnings);

        let deleted = self
            .repository
            .replace_fixtures(tournament_id, &Stage::FINAL_DAY, &fixtures)
            .await?;

        log::info!(
            "Generated {} final-day fixtures for tournament {} ({} replaced)",
            fixtures.len(),
            tournament_id,
            deleted
        );
        for warning in &warnings {
            log::warn!("Tournament {}: {}", tournament_id, warning);
        }

        Ok(GenerationReport {
            fixtures,
            warnings,
            deleted,
        })
    }

    /// Rank every group from the preliminary results and store the tables
    pub async fn recalculate_standings(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Vec<GroupStandings>> {
        let tournament = self.load_tournament(tournament_id).await?;
        let standings = self.rank(&tournament).await?;

        self.repository.replace_standings(tournament_id, &standings).await?;

        log::info!(
            "Recalculated standings for {} groups in tournament {}",
            standings.len(),
            tournament_id
        );
        Ok(standings)
    }

    /// Replace the preliminary fixtures with a fresh round-robin.
    ///
    /// Groups that cannot be scheduled are reported as warnings; the rest are
    /// still written. Results recorded against the old fixtures are dropped,
    /// since the new fixtures reuse their numbers.
    pub async fn generate_preliminary(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<GenerationReport> {
        let tournament = self.load_tournament(tournament_id).await?;
        let teams = self.repository.list_teams(tournament_id).await?;
        if teams.is_empty() {
            return Err(PreconditionError::NoGroups(tournament_id).into());
        }
        let exclusions = self.repository.list_exclusions(tournament_id).await?;

        let schedule =
            generate_preliminary_schedule(&teams, &exclusions, &tournament.config.preliminary);

        let mut warnings = group_count_warning(&tournament, group_labels(&teams).len());
        warnings.extend(schedule.errors.into_iter().map(Warning::from));

        let deleted = self
            .repository
            .replace_fixtures(tournament_id, &[Stage::Preliminary], &schedule.fixtures)
            .await?;

        log::info!(
            "Generated {} preliminary fixtures for tournament {} ({} replaced)",
            schedule.fixtures.len(),
            tournament_id,
            deleted
        );
        for warning in &warnings {
            log::warn!("Tournament {}: {}", tournament_id, warning);
        }

        Ok(GenerationReport {
            fixtures: schedule.fixtures,
            warnings,
            deleted,
        })
    }

    /// Fill in the placeholders of one bracket fixture from finished results
    pub async fn reconcile_fixture(
        &self,
        tournament_id: TournamentId,
        stage: Stage,
        number: u32,
    ) -> ScheduleResult<GeneratedFixture> {
        self.load_tournament(tournament_id).await?;

        let fixtures = self.repository.list_fixtures(tournament_id, &BRACKET_STAGES).await?;
        let results: HashMap<FixtureKey, MatchResult> = self
            .repository
            .list_results(tournament_id, &BRACKET_STAGES)
            .await?
            .into_iter()
            .collect();

        let target = FixtureKey::new(stage, number);
        let fixture = reconcile(&fixtures, target, &results)?;
        self.repository.update_fixture(tournament_id, &fixture).await?;

        log::info!("Reconciled {} in tournament {}", target, tournament_id);
        Ok(fixture)
    }

    async fn load_tournament(&self, tournament_id: TournamentId) -> ScheduleResult<TournamentInfo> {
        self.repository
            .find_tournament(tournament_id)
            .await?
            .ok_or(ScheduleError::NotFound(tournament_id))
    }

    async fn preliminary_results(
        &self,
        tournament_id: TournamentId,
    ) -> ScheduleResult<Vec<MatchResult>> {
        Ok(self
            .repository
            .list_results(tournament_id, &[Stage::Preliminary])
            .await?
            .into_iter()
            .map(|(_, result)| result)
            .collect())
    }

    async fn rank(&self, tournament: &TournamentInfo) -> ScheduleResult<Vec<GroupStandings>> {
        let teams = self.repository.list_teams(tournament.id).await?;
        if group_labels(&teams).is_empty() {
            return Err(PreconditionError::NoGroups(tournament.id).into());
        }

        let results = self.preliminary_results(tournament.id).await?;
        let standings = rank_groups(tournament.id, &teams, &results);
        log_lotteries(tournament.id, &standings);
        Ok(standings)
    }
}

fn final_day(tournament: &TournamentInfo) -> Result<NaiveDate, ConfigurationError> {
    tournament.config.final_day.ok_or(ConfigurationError::MissingFinalDay)
}

fn group_count_warning(tournament: &TournamentInfo, derived: usize) -> Vec<Warning> {
    let declared = tournament.config.group_count;
    if declared != 0 && declared != derived {
        vec![Warning::GroupCountMismatch { declared, derived }]
    } else {
        Vec::new()
    }
}

/// Log the digest behind every lottery placement so a draw can be audited
fn log_lotteries(tournament_id: TournamentId, standings: &[GroupStandings]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    for group in standings {
        for row in group.rows.iter().filter(|r| r.tie_break == Some(TieBreakReason::Lottery)) {
            let tied: Vec<_> = group
                .rows
                .iter()
                .filter(|other| other.sort_key() == row.sort_key())
                .map(|other| other.team_id)
                .collect();
            log::debug!(
                "Group {} lottery: team {} rank {} digest {}",
                group.group,
                row.team_id,
                row.rank,
                lottery_digest_hex(tournament_id, &tied, row.team_id)
            );
        }
    }
}

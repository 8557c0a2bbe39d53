//! Final-day elimination bracket.
//!
//! Supported shapes are fixed: 2 groups play a single final, 4 groups play
//! semifinals, 8 groups start from quarterfinals. Later rounds refer to
//! earlier ones through [`Placeholder`]s until [`reconcile`] substitutes the
//! real teams.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use crate::errors::{ConfigurationError, PreconditionError, Warning};
use crate::models::{
    FixtureKey, GeneratedFixture, GroupStandings, MatchResult, Outcome, Participant, Placeholder,
    Stage, TeamId, TournamentConfig,
};

/// Group counts the bracket generator can handle
pub const SUPPORTED_GROUP_COUNTS: [usize; 3] = [2, 4, 8];

/// Bracket fixtures plus any warnings raised while building them
#[derive(Debug, Clone, Default)]
pub struct BracketOutput {
    pub fixtures: Vec<GeneratedFixture>,
    pub warnings: Vec<Warning>,
}

/// Build the bracket for `group_count` groups.
///
/// Group order is alphabetical by label; "group i" below means the i-th
/// label. Unsupported counts and groups without a winner produce a warning
/// and no fixtures.
pub fn generate_bracket(
    standings: &[GroupStandings],
    group_count: usize,
    final_day: NaiveDate,
    config: &TournamentConfig,
) -> BracketOutput {
    let mut output = BracketOutput::default();

    if let Err(err) = check_group_count(group_count) {
        log::warn!("{}", err);
        output.warnings.push(err.into());
        return output;
    }

    let mut groups: Vec<&GroupStandings> = standings.iter().collect();
    groups.sort_by(|a, b| a.group.cmp(&b.group));

    let mut seeds: Vec<TeamId> = Vec::with_capacity(group_count);
    for i in 0..group_count {
        match groups.get(i) {
            Some(group) => match group.at_rank(1) {
                Some(row) => seeds.push(row.team_id),
                None => output.warnings.push(Warning::MissingSeed {
                    group: group.group.clone(),
                }),
            },
            None => output.warnings.push(Warning::MissingSeed {
                group: format!("#{}", i + 1),
            }),
        }
    }
    if !output.warnings.is_empty() {
        return output;
    }

    let builder = FixtureBuilder { final_day, config };
    let team = Participant::Team;
    let winner = |stage, n| Participant::Placeholder(Placeholder::winner(stage, n));

    match group_count {
        2 => {
            output
                .fixtures
                .push(builder.fixture(Stage::Final, 1, team(seeds[0]), team(seeds[1])));
        }
        4 => {
            output.fixtures.extend([
                builder.fixture(Stage::Semifinal, 1, team(seeds[0]), team(seeds[2])),
                builder.fixture(Stage::Semifinal, 2, team(seeds[1]), team(seeds[3])),
            ]);
            output.fixtures.extend(builder.medal_matches());
        }
        8 => {
            for i in 0..4 {
                output.fixtures.push(builder.fixture(
                    Stage::Quarterfinal,
                    i as u32 + 1,
                    team(seeds[i]),
                    team(seeds[i + 4]),
                ));
            }
            output.fixtures.extend([
                builder.fixture(
                    Stage::Semifinal,
                    1,
                    winner(Stage::Quarterfinal, 1),
                    winner(Stage::Quarterfinal, 2),
                ),
                builder.fixture(
                    Stage::Semifinal,
                    2,
                    winner(Stage::Quarterfinal, 3),
                    winner(Stage::Quarterfinal, 4),
                ),
            ]);
            output.fixtures.extend(builder.medal_matches());
        }
        _ => {}
    }

    output
}

/// Reject group counts outside [`SUPPORTED_GROUP_COUNTS`]
pub fn check_group_count(group_count: usize) -> Result<(), ConfigurationError> {
    if SUPPORTED_GROUP_COUNTS.contains(&group_count) {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedBracketGroupCount(group_count))
    }
}

struct FixtureBuilder<'a> {
    final_day: NaiveDate,
    config: &'a TournamentConfig,
}

impl FixtureBuilder<'_> {
    fn fixture(
        &self,
        stage: Stage,
        number: u32,
        home: Participant,
        away: Participant,
    ) -> GeneratedFixture {
        let base = self
            .config
            .bracket_kickoffs
            .for_stage(stage)
            .unwrap_or_default();
        let offset = Duration::minutes(i64::from(number - 1) * self.config.slot_interval_minutes);

        GeneratedFixture {
            stage,
            number,
            group: None,
            venue: self.config.finals_venue.clone(),
            kickoff: self.final_day.and_time(base) + offset,
            home,
            away,
            rematch: false,
        }
    }

    /// Third-place match and final, fed by the two semifinals
    fn medal_matches(&self) -> [GeneratedFixture; 2] {
        [
            self.fixture(
                Stage::ThirdPlace,
                1,
                Participant::Placeholder(Placeholder::loser(Stage::Semifinal, 1)),
                Participant::Placeholder(Placeholder::loser(Stage::Semifinal, 2)),
            ),
            self.fixture(
                Stage::Final,
                1,
                Participant::Placeholder(Placeholder::winner(Stage::Semifinal, 1)),
                Participant::Placeholder(Placeholder::winner(Stage::Semifinal, 2)),
            ),
        ]
    }
}

/// Substitute real teams for the placeholders of one fixture.
///
/// Every placeholder needs a completed, decided result for its source
/// fixture. If any is missing the whole call fails and nothing is changed.
pub fn reconcile(
    fixtures: &[GeneratedFixture],
    target: FixtureKey,
    results: &HashMap<FixtureKey, MatchResult>,
) -> Result<GeneratedFixture, PreconditionError> {
    let fixture = fixtures
        .iter()
        .find(|f| f.key() == target)
        .ok_or(PreconditionError::FixtureNotFound(target))?;

    let home = resolve(fixtures, &fixture.home, results)?;
    let away = resolve(fixtures, &fixture.away, results)?;

    Ok(GeneratedFixture {
        home,
        away,
        ..fixture.clone()
    })
}

/// Bracket after a bulk reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Every bracket fixture, reconciled where possible
    pub fixtures: Vec<GeneratedFixture>,
    /// Fixtures whose placeholders were replaced in this pass
    pub updated: Vec<FixtureKey>,
    /// Fixtures still waiting, with the reason
    pub pending: Vec<(FixtureKey, PreconditionError)>,
}

/// Reconcile every fixture whose prerequisites are complete.
///
/// Fixtures are visited in bracket order so a semifinal reconciled in this
/// pass is already concrete when the final is checked against it.
pub fn reconcile_all(
    fixtures: &[GeneratedFixture],
    results: &HashMap<FixtureKey, MatchResult>,
) -> Reconciliation {
    let mut working: Vec<GeneratedFixture> = fixtures.to_vec();
    working.sort_by_key(|f| f.key());

    let mut outcome = Reconciliation::default();
    let keys: Vec<FixtureKey> = working
        .iter()
        .filter(|f| !f.is_resolved())
        .map(|f| f.key())
        .collect();

    for key in keys {
        match reconcile(&working, key, results) {
            Ok(resolved) => {
                if let Some(slot) = working.iter_mut().find(|f| f.key() == key) {
                    *slot = resolved;
                }
                outcome.updated.push(key);
            }
            Err(err) => outcome.pending.push((key, err)),
        }
    }

    outcome.fixtures = working;
    outcome
}

fn resolve(
    fixtures: &[GeneratedFixture],
    participant: &Participant,
    results: &HashMap<FixtureKey, MatchResult>,
) -> Result<Participant, PreconditionError> {
    let placeholder = match participant {
        Participant::Team(_) => return Ok(*participant),
        Participant::Placeholder(p) => p,
    };
    let source = placeholder.source;

    let prerequisite = fixtures
        .iter()
        .find(|f| f.key() == source)
        .ok_or(PreconditionError::FixtureNotFound(source))?;

    // A result only counts once the fixture it belongs to has real teams
    if !prerequisite.is_resolved() {
        return Err(PreconditionError::PrerequisiteIncomplete(source));
    }

    let result = results
        .get(&source)
        .filter(|r| r.completed)
        .ok_or(PreconditionError::PrerequisiteIncomplete(source))?;

    for side in [&prerequisite.home, &prerequisite.away] {
        if let Participant::Team(id) = side {
            if result.home != *id && result.away != *id {
                return Err(PreconditionError::ParticipantMismatch { fixture: source });
            }
        }
    }

    let (winner, loser) = result
        .decided()
        .ok_or(PreconditionError::UndecidedResult(source))?;

    Ok(Participant::Team(match placeholder.outcome {
        Outcome::Winner => winner,
        Outcome::Loser => loser,
    }))
}

//! Preliminary round-robin generation.

use std::collections::BTreeMap;

use crate::errors::ConfigurationError;
use crate::models::{ExclusionPair, GeneratedFixture, Participant, SlotPlan, Stage, Team};

/// Outcome of a multi-group preliminary generation
#[derive(Debug, Clone, Default)]
pub struct PreliminarySchedule {
    pub fixtures: Vec<GeneratedFixture>,
    /// Groups that could not be scheduled
    pub errors: Vec<ConfigurationError>,
}

/// Pair every two teams of one group exactly once, skipping excluded pairs.
///
/// Teams are taken in registration order (`slot`, then id) and the earlier
/// team plays at home. Fixtures come back unnumbered and unplaced: `number`
/// is 0 and `kickoff` is the plan's first kickoff until [`place`] runs.
pub fn pair_group(
    group: &str,
    teams: &[Team],
    exclusions: &[ExclusionPair],
    plan: &SlotPlan,
) -> Result<Vec<GeneratedFixture>, ConfigurationError> {
    let mut members: Vec<&Team> = teams.iter().filter(|t| t.group == group).collect();
    members.sort_by_key(|t| (t.slot, t.id));
    members.dedup_by_key(|t| t.id);

    if members.len() % 2 == 1 {
        return Err(ConfigurationError::OddTeamCount {
            group: group.to_string(),
            teams: members.len(),
        });
    }

    let excluded: Vec<&ExclusionPair> = exclusions.iter().filter(|e| e.group() == group).collect();

    let mut fixtures = Vec::new();
    for (i, home) in members.iter().enumerate() {
        for away in &members[i + 1..] {
            if excluded.iter().any(|e| e.excludes(home.id, away.id)) {
                continue;
            }
            fixtures.push(GeneratedFixture {
                stage: Stage::Preliminary,
                number: 0,
                group: Some(group.to_string()),
                venue: plan.venue.clone(),
                kickoff: plan.first_kickoff,
                home: Participant::Team(home.id),
                away: Participant::Team(away.id),
                rematch: false,
            });
        }
    }

    Ok(fixtures)
}

/// Number fixtures from `first_number` and assign consecutive slots of `plan`
/// starting at slot index `first_slot`.
pub fn place(
    fixtures: &mut [GeneratedFixture],
    plan: &SlotPlan,
    first_number: u32,
    first_slot: usize,
) {
    for (offset, fixture) in fixtures.iter_mut().enumerate() {
        fixture.number = first_number + offset as u32;
        fixture.kickoff = plan.kickoff_at(first_slot + offset);
    }
}

/// Generate and place the round-robin for a single group
pub fn generate_group_fixtures(
    group: &str,
    teams: &[Team],
    exclusions: &[ExclusionPair],
    plan: &SlotPlan,
) -> Result<Vec<GeneratedFixture>, ConfigurationError> {
    validate_plan(plan)?;
    let mut fixtures = pair_group(group, teams, exclusions, plan)?;
    place(&mut fixtures, plan, 1, 0);
    Ok(fixtures)
}

/// Generate the round-robin for every group on the roster.
///
/// Groups are processed in label order and share one run of slots. A group
/// with a configuration error is reported and skipped; the others proceed.
pub fn generate_preliminary_schedule(
    teams: &[Team],
    exclusions: &[ExclusionPair],
    plan: &SlotPlan,
) -> PreliminarySchedule {
    let mut schedule = PreliminarySchedule::default();

    if let Err(err) = validate_plan(plan) {
        schedule.errors.push(err);
        return schedule;
    }

    let mut groups: BTreeMap<&str, Vec<Team>> = BTreeMap::new();
    for team in teams {
        groups.entry(team.group.as_str()).or_default().push(team.clone());
    }

    for (group, members) in groups {
        match pair_group(group, &members, exclusions, plan) {
            Ok(mut fixtures) => {
                let next = schedule.fixtures.len();
                place(&mut fixtures, plan, next as u32 + 1, next);
                log::debug!("Group {}: {} preliminary fixtures", group, fixtures.len());
                schedule.fixtures.extend(fixtures);
            }
            Err(err) => {
                log::warn!("Skipping group {}: {}", group, err);
                schedule.errors.push(err);
            }
        }
    }

    schedule
}

fn validate_plan(plan: &SlotPlan) -> Result<(), ConfigurationError> {
    if plan.fixtures_per_day == 0 {
        return Err(ConfigurationError::InvalidSlotPlan(
            "fixtures_per_day must be greater than 0".to_string(),
        ));
    }
    if plan.interval_minutes <= 0 && plan.fixtures_per_day > 1 {
        return Err(ConfigurationError::InvalidSlotPlan(
            "interval_minutes must be positive".to_string(),
        ));
    }
    Ok(())
}

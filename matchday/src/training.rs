//! Final-day training fixtures for teams outside the bracket.
//!
//! Teams of equal rank in different groups are paired in two passes using
//! fixed crossing patterns per group count, subject to a per-team quota.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::{ConfigurationError, Warning};
use crate::models::{GeneratedFixture, GroupStandings, Participant, Stage, TeamId, TournamentConfig};

/// Group index pairs (into the label-ordered group list) for one pass
pub type CrossingPattern = &'static [(usize, usize)];

/// Training fixtures plus any warnings raised while building them
#[derive(Debug, Clone, Default)]
pub struct TrainingOutput {
    pub fixtures: Vec<GeneratedFixture>,
    pub warnings: Vec<Warning>,
}

/// First and second pass crossing patterns for a supported group count
pub fn crossing_patterns(group_count: usize) -> Option<(CrossingPattern, CrossingPattern)> {
    match group_count {
        2 => Some((&[(0, 1)], &[])),
        3 => Some((&[(0, 1)], &[(0, 2), (1, 2)])),
        4 => Some((&[(0, 2), (1, 3)], &[(0, 3), (1, 2)])),
        5 => Some((&[(0, 2), (1, 3)], &[(0, 4), (1, 2), (3, 4)])),
        6 => Some((&[(0, 3), (1, 4), (2, 5)], &[(0, 4), (1, 5), (2, 3)])),
        _ => None,
    }
}

/// Pair every team ranked second or lower into training fixtures.
///
/// `played` holds unordered pairs (low id first) that already met; such
/// pairings are still scheduled but flagged as rematches.
pub fn pair_training_matches(
    standings: &[GroupStandings],
    played: &BTreeSet<(TeamId, TeamId)>,
    final_day: NaiveDate,
    config: &TournamentConfig,
) -> TrainingOutput {
    let mut output = TrainingOutput::default();

    if config.training_venues.is_empty() {
        output.warnings.push(ConfigurationError::NoTrainingVenues.into());
        return output;
    }
    if config.training_kickoffs.is_empty() {
        output.warnings.push(ConfigurationError::EmptyKickoffTemplate.into());
        return output;
    }

    let mut groups: Vec<&GroupStandings> = standings.iter().collect();
    groups.sort_by(|a, b| a.group.cmp(&b.group));

    let Some((first_pass, second_pass)) = crossing_patterns(groups.len()) else {
        log::warn!("No training crossing pattern for {} groups", groups.len());
        output.warnings.push(Warning::UnsupportedTrainingGroupCount {
            group_count: groups.len(),
        });
        return output;
    };

    // rank -> team per group index
    let mut by_rank: BTreeMap<u32, Vec<Option<TeamId>>> = BTreeMap::new();
    for (index, group) in groups.iter().enumerate() {
        for row in group.rows.iter().filter(|row| row.rank >= 2) {
            by_rank.entry(row.rank).or_insert_with(|| vec![None; groups.len()])[index] =
                Some(row.team_id);
        }
    }

    let quota = config.training_quota;
    let mut counts: HashMap<TeamId, usize> = HashMap::new();
    let mut accepted: Vec<(TeamId, TeamId)> = Vec::new();
    let mut seen: BTreeSet<(TeamId, TeamId)> = BTreeSet::new();

    for pattern in [first_pass, second_pass] {
        for slots in by_rank.values() {
            for &(i, j) in pattern {
                let (Some(home), Some(away)) = (slots[i], slots[j]) else {
                    continue;
                };
                let key = (home.min(away), home.max(away));
                if seen.contains(&key) {
                    continue;
                }
                let home_count = counts.get(&home).copied().unwrap_or(0);
                let away_count = counts.get(&away).copied().unwrap_or(0);
                if home_count >= quota || away_count >= quota {
                    continue;
                }
                seen.insert(key);
                *counts.entry(home).or_default() += 1;
                *counts.entry(away).or_default() += 1;
                accepted.push((home, away));
            }
        }
    }

    let venues = &config.training_venues;
    let mut per_venue = vec![0usize; venues.len()];
    let mut placed: Vec<(usize, GeneratedFixture)> = Vec::with_capacity(accepted.len());

    for (index, (home, away)) in accepted.into_iter().enumerate() {
        let venue = index % venues.len();
        let slot = per_venue[venue];
        per_venue[venue] += 1;

        let kickoff = kickoff_for_slot(final_day, config, slot);
        if slot >= config.training_kickoffs.len() {
            output.warnings.push(Warning::KickoffOverflow {
                venue: venues[venue].clone(),
                slot: slot + 1,
            });
        }

        let rematch = played.contains(&(home.min(away), home.max(away)));
        if rematch {
            output.warnings.push(Warning::Rematch { home, away });
        }

        placed.push((
            venue,
            GeneratedFixture {
                stage: Stage::Training,
                number: 0,
                group: None,
                venue: venues[venue].clone(),
                kickoff,
                home: Participant::Team(home),
                away: Participant::Team(away),
                rematch,
            },
        ));
    }

    placed.sort_by(|(va, a), (vb, b)| va.cmp(vb).then(a.kickoff.cmp(&b.kickoff)));
    output.fixtures = placed
        .into_iter()
        .enumerate()
        .map(|(index, (_, fixture))| GeneratedFixture {
            number: index as u32 + 1,
            ..fixture
        })
        .collect();

    for group in &groups {
        for row in group.rows.iter().filter(|row| row.rank >= 2) {
            let scheduled = counts.get(&row.team_id).copied().unwrap_or(0);
            if scheduled < quota {
                output.warnings.push(Warning::QuotaUnderfilled {
                    team: row.team_id,
                    scheduled,
                    quota,
                });
            }
        }
    }

    output
}

/// Kickoff for the `slot`-th fixture at a venue. Slots beyond the template
/// continue from its last entry at the configured interval.
fn kickoff_for_slot(final_day: NaiveDate, config: &TournamentConfig, slot: usize) -> NaiveDateTime {
    let template = &config.training_kickoffs;
    match template.get(slot) {
        Some(time) => final_day.and_time(*time),
        None => {
            let last = template.last().copied().unwrap_or_default();
            let extra = (slot + 1 - template.len()) as i64;
            final_day.and_time(last) + Duration::minutes(extra * config.slot_interval_minutes)
        }
    }
}

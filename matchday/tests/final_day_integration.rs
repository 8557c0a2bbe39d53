//! Integration tests for a full tournament run
//!
//! These tests drive the generators end to end without a database:
//! preliminary schedule, results, standings, bracket, training and
//! reconciliation of the medal matches.

use chrono::NaiveDate;
use matchday::{
    FixtureKey, GeneratedFixture, MatchResult, Participant, PreconditionError, Stage, Team,
    TournamentConfig, Warning,
    bracket::{generate_bracket, reconcile, reconcile_all},
    schedule::generate_preliminary_schedule,
    standings::{played_pairs, rank_groups},
    training::pair_training_matches,
};
use std::collections::HashMap;

const TOURNAMENT: i64 = 2026;

fn final_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, 12).unwrap()
}

fn roster(groups: &[&str], per_group: i64) -> Vec<Team> {
    let mut teams = Vec::new();
    for (g, label) in groups.iter().enumerate() {
        for n in 1..=per_group {
            let id = (g as i64 + 1) * 100 + n;
            teams.push(Team::new(id, format!("Club {}", id), *label, n as u32));
        }
    }
    teams
}

/// Lower id wins by the id gap, capped at three goals
fn play(fixture: &GeneratedFixture) -> MatchResult {
    let home = fixture.home.team_id().unwrap();
    let away = fixture.away.team_id().unwrap();
    let margin = (away - home).clamp(1, 3) as u32;
    MatchResult::final_score(home, away, margin, 0)
}

fn team(p: &Participant) -> i64 {
    p.team_id().expect("participant should be concrete")
}

#[test]
fn test_four_group_tournament() {
    let config = TournamentConfig::standard(final_day());
    let teams = roster(&["A", "B", "C", "D"], 4);

    let preliminary = generate_preliminary_schedule(&teams, &[], &config.preliminary);
    assert!(preliminary.errors.is_empty());
    assert_eq!(preliminary.fixtures.len(), 24);

    let results: Vec<MatchResult> = preliminary.fixtures.iter().map(play).collect();
    let standings = rank_groups(TOURNAMENT, &teams, &results);
    assert_eq!(standings.len(), 4);
    for group in &standings {
        let ranks: Vec<u32> = group.rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(group.rows.iter().all(|r| r.tie_break.is_none()));
    }

    let bracket = generate_bracket(&standings, standings.len(), final_day(), &config);
    assert!(bracket.warnings.is_empty());
    assert_eq!(bracket.fixtures.len(), 4);

    let sf1 = &bracket.fixtures[0];
    assert_eq!(sf1.key(), FixtureKey::new(Stage::Semifinal, 1));
    assert_eq!((team(&sf1.home), team(&sf1.away)), (101, 301));
    let sf2 = &bracket.fixtures[1];
    assert_eq!((team(&sf2.home), team(&sf2.away)), (201, 401));

    let training = pair_training_matches(&standings, &played_pairs(&results), final_day(), &config);
    assert_eq!(training.fixtures.len(), 12);
    assert!(training.fixtures.iter().all(|f| !f.rematch));
    for row in standings.iter().flat_map(|g| g.rows.iter()).filter(|r| r.rank >= 2) {
        let count = training.fixtures.iter().filter(|f| f.involves(row.team_id)).count();
        assert_eq!(count, config.training_quota, "team {}", row.team_id);
    }

    // Semifinal 2 goes to penalties; the away side wins the shootout
    let mut knockout = HashMap::new();
    knockout.insert(
        FixtureKey::new(Stage::Semifinal, 1),
        MatchResult::final_score(101, 301, 0, 2),
    );
    knockout.insert(
        FixtureKey::new(Stage::Semifinal, 2),
        MatchResult::final_score(201, 401, 1, 1).with_penalties(4, 5),
    );

    let reconciled = reconcile_all(&bracket.fixtures, &knockout);
    assert!(reconciled.pending.is_empty());
    assert_eq!(reconciled.updated.len(), 2);

    let final_match = reconciled
        .fixtures
        .iter()
        .find(|f| f.stage == Stage::Final)
        .unwrap();
    assert_eq!((team(&final_match.home), team(&final_match.away)), (301, 401));

    let third =
        reconcile(&bracket.fixtures, FixtureKey::new(Stage::ThirdPlace, 1), &knockout).unwrap();
    assert_eq!((team(&third.home), team(&third.away)), (101, 201));
}

#[test]
fn test_eight_group_bracket_waits_for_quarterfinals() {
    let config = TournamentConfig::standard(final_day());
    let labels = ["A", "B", "C", "D", "E", "F", "G", "H"];
    let teams = roster(&labels, 2);

    let preliminary = generate_preliminary_schedule(&teams, &[], &config.preliminary);
    let results: Vec<MatchResult> = preliminary.fixtures.iter().map(play).collect();
    let standings = rank_groups(TOURNAMENT, &teams, &results);

    let bracket = generate_bracket(&standings, labels.len(), final_day(), &config);
    assert!(bracket.warnings.is_empty());
    assert_eq!(bracket.fixtures.len(), 8);

    let qf1 = &bracket.fixtures[0];
    assert_eq!((team(&qf1.home), team(&qf1.away)), (101, 501));

    // Only the first two quarterfinals are done
    let mut knockout = HashMap::new();
    knockout.insert(
        FixtureKey::new(Stage::Quarterfinal, 1),
        MatchResult::final_score(101, 501, 3, 1),
    );
    knockout.insert(
        FixtureKey::new(Stage::Quarterfinal, 2),
        MatchResult::final_score(201, 601, 0, 1),
    );

    let reconciled = reconcile_all(&bracket.fixtures, &knockout);
    assert_eq!(reconciled.updated, vec![FixtureKey::new(Stage::Semifinal, 1)]);

    let sf1 = reconciled
        .fixtures
        .iter()
        .find(|f| f.key() == FixtureKey::new(Stage::Semifinal, 1))
        .unwrap();
    assert_eq!((team(&sf1.home), team(&sf1.away)), (101, 601));

    let sf2 = reconciled
        .fixtures
        .iter()
        .find(|f| f.key() == FixtureKey::new(Stage::Semifinal, 2))
        .unwrap();
    assert!(sf2.home.is_placeholder());
    assert!(sf2.away.is_placeholder());
}

#[test]
fn test_final_ignores_semifinal_result_before_semifinal_is_drawn() {
    let config = TournamentConfig::standard(final_day());
    let labels = ["A", "B", "C", "D", "E", "F", "G", "H"];
    let teams = roster(&labels, 2);

    let preliminary = generate_preliminary_schedule(&teams, &[], &config.preliminary);
    let results: Vec<MatchResult> = preliminary.fixtures.iter().map(play).collect();
    let standings = rank_groups(TOURNAMENT, &teams, &results);
    let bracket = generate_bracket(&standings, labels.len(), final_day(), &config);

    // Semifinal results entered while the semifinals still hold placeholders
    let mut knockout = HashMap::new();
    knockout.insert(
        FixtureKey::new(Stage::Semifinal, 1),
        MatchResult::final_score(101, 601, 2, 1),
    );
    knockout.insert(
        FixtureKey::new(Stage::Semifinal, 2),
        MatchResult::final_score(301, 701, 1, 0),
    );

    let err = reconcile(&bracket.fixtures, FixtureKey::new(Stage::Final, 1), &knockout)
        .unwrap_err();
    assert_eq!(
        err,
        PreconditionError::PrerequisiteIncomplete(FixtureKey::new(Stage::Semifinal, 1))
    );

    let reconciled = reconcile_all(&bracket.fixtures, &knockout);
    assert!(reconciled.updated.is_empty());
}

#[test]
fn test_unsupported_group_count_still_gets_training() {
    let config = TournamentConfig::standard(final_day());
    let teams = roster(&["A", "B", "C"], 4);

    let preliminary = generate_preliminary_schedule(&teams, &[], &config.preliminary);
    let results: Vec<MatchResult> = preliminary.fixtures.iter().map(play).collect();
    let standings = rank_groups(TOURNAMENT, &teams, &results);

    let bracket = generate_bracket(&standings, 3, final_day(), &config);
    assert!(bracket.fixtures.is_empty());
    assert_eq!(
        bracket.warnings,
        vec![Warning::UnsupportedBracketSize { group_count: 3 }]
    );

    let training = pair_training_matches(&standings, &played_pairs(&results), final_day(), &config);
    assert!(!training.fixtures.is_empty());
    assert!(training.fixtures.iter().all(|f| f.stage == Stage::Training));
}

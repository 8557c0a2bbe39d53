/// Property-based tests for ranking and scheduling using proptest
///
/// These tests check the table and schedule invariants over randomly
/// generated groups and results.
use chrono::NaiveDate;
use matchday::{
    ExclusionPair, MatchResult, StandingRow, Team, TournamentConfig,
    schedule::generate_group_fixtures,
    standings::{lottery_key, rank_group, rank_groups},
    training::pair_training_matches,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TOURNAMENT: i64 = 42;

fn roster(size: usize) -> Vec<Team> {
    (0..size)
        .map(|i| Team::new(i as i64 + 1, format!("Team {}", i + 1), "A", i as u32 + 1))
        .collect()
}

// Strategy: a group of 2-6 teams where every pair has played once
fn group_strategy() -> impl Strategy<Value = (Vec<Team>, Vec<MatchResult>)> {
    (2usize..=6).prop_flat_map(|size| {
        let pairs = size * (size - 1) / 2;
        prop::collection::vec((0u32..=4, 0u32..=4), pairs).prop_map(move |scores| {
            let teams = roster(size);
            let mut results = Vec::with_capacity(pairs);
            let mut scores = scores.into_iter();
            for i in 0..size {
                for j in i + 1..size {
                    if let Some((h, a)) = scores.next() {
                        results.push(MatchResult::final_score(teams[i].id, teams[j].id, h, a));
                    }
                }
            }
            (teams, results)
        })
    })
}

fn order(rows: &[StandingRow]) -> Vec<(i64, u32)> {
    rows.iter().map(|r| (r.team_id, r.rank)).collect()
}

proptest! {
    #[test]
    fn test_points_total_matches_results((teams, results) in group_strategy()) {
        let rows = rank_group(TOURNAMENT, "A", &teams, &results);

        let drawn = results.iter().filter(|r| r.home_total() == r.away_total()).count() as u32;
        let decisive = results.len() as u32 - drawn;
        let total: u32 = rows.iter().map(|r| r.points()).sum();

        prop_assert_eq!(total, 3 * decisive + 2 * drawn);
    }

    #[test]
    fn test_ranks_are_a_permutation((teams, results) in group_strategy()) {
        let rows = rank_group(TOURNAMENT, "A", &teams, &results);

        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        let expected: Vec<u32> = (1..=teams.len() as u32).collect();
        prop_assert_eq!(ranks, expected);

        let ids: BTreeSet<i64> = rows.iter().map(|r| r.team_id).collect();
        prop_assert_eq!(ids.len(), teams.len());
    }

    #[test]
    fn test_higher_rank_never_has_fewer_points((teams, results) in group_strategy()) {
        let rows = rank_group(TOURNAMENT, "A", &teams, &results);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].sort_key() >= pair[1].sort_key());
        }
    }

    #[test]
    fn test_ranking_ignores_input_order((teams, results) in group_strategy()) {
        let forward = rank_group(TOURNAMENT, "A", &teams, &results);

        let mut teams_rev = teams.clone();
        teams_rev.reverse();
        let mut results_rev = results.clone();
        results_rev.reverse();
        let backward = rank_group(TOURNAMENT, "A", &teams_rev, &results_rev);

        prop_assert_eq!(order(&forward), order(&backward));
    }

    #[test]
    fn test_lottery_key_ignores_tie_order(ids in prop::collection::btree_set(1i64..1000, 2..6)) {
        let sorted: Vec<i64> = ids.iter().copied().collect();
        let mut reversed = sorted.clone();
        reversed.reverse();

        for &team in &sorted {
            prop_assert_eq!(
                lottery_key(TOURNAMENT, &sorted, team),
                lottery_key(TOURNAMENT, &reversed, team)
            );
        }
    }

    #[test]
    fn test_exclusion_order_is_irrelevant(
        (size, a, b) in (1usize..=4)
            .prop_flat_map(|half| (Just(half * 2), 0..half * 2, 0..half * 2))
    ) {
        prop_assume!(a != b);
        let teams = roster(size);
        let config = TournamentConfig::standard(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());

        let forward = generate_group_fixtures(
            "A", &teams, &[ExclusionPair::new("A", teams[a].id, teams[b].id)], &config.preliminary,
        ).unwrap();
        let swapped = generate_group_fixtures(
            "A", &teams, &[ExclusionPair::new("A", teams[b].id, teams[a].id)], &config.preliminary,
        ).unwrap();

        prop_assert_eq!(forward.len(), size * (size - 1) / 2 - 1);
        prop_assert_eq!(forward, swapped);
    }

    #[test]
    fn test_training_never_exceeds_quota(quota in 0usize..=4, groups in 2usize..=6) {
        let labels = ["A", "B", "C", "D", "E", "F"];
        let mut teams = Vec::new();
        let mut results = Vec::new();
        for (g, label) in labels.iter().take(groups).enumerate() {
            let ids: Vec<i64> = (1..=4).map(|n| g as i64 * 10 + n).collect();
            for (slot, id) in ids.iter().enumerate() {
                teams.push(Team::new(*id, format!("Team {}", id), *label, slot as u32 + 1));
            }
            for i in 0..ids.len() {
                for j in i + 1..ids.len() {
                    results.push(MatchResult::final_score(ids[i], ids[j], 1, 0));
                }
            }
        }

        let final_day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let mut config = TournamentConfig::standard(final_day);
        config.training_quota = quota;

        let standings = rank_groups(TOURNAMENT, &teams, &results);
        let output = pair_training_matches(&standings, &BTreeSet::new(), final_day, &config);

        for team in &teams {
            let count = output.fixtures.iter().filter(|f| f.involves(team.id)).count();
            prop_assert!(count <= quota, "team {} has {} fixtures", team.id, count);
        }
        let pairs: BTreeSet<(i64, i64)> = output
            .fixtures
            .iter()
            .filter_map(|f| Some((f.home.team_id()?, f.away.team_id()?)))
            .map(|(h, a)| (h.min(a), h.max(a)))
            .collect();
        prop_assert_eq!(pairs.len(), output.fixtures.len());
    }
}

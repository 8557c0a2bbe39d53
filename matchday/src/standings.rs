//! Group standings and tie-breaking.
//!
//! Teams are ordered by points, goal difference and goals scored. Two-team
//! ties fall back to the head-to-head record; anything still level is settled
//! by a deterministic lottery keyed on a SHA-256 digest.

use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    GroupStandings, MatchResult, StandingRow, Team, TeamId, TieBreakReason, TournamentId,
};

/// Rank one group.
///
/// Only completed results between two members of `group` are counted. The
/// returned rows are ordered by rank, and ranks always run 1..=N.
pub fn rank_group(
    tournament_id: TournamentId,
    group: &str,
    teams: &[Team],
    results: &[MatchResult],
) -> Vec<StandingRow> {
    let mut members: Vec<&Team> = teams.iter().filter(|t| t.group == group).collect();
    members.sort_by_key(|t| (t.slot, t.id));
    members.dedup_by_key(|t| t.id);

    let mut rows: Vec<StandingRow> = members
        .iter()
        .map(|t| StandingRow::empty(group, t.id))
        .collect();
    let index: HashMap<TeamId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.team_id, i))
        .collect();

    let counted: Vec<&MatchResult> = results
        .iter()
        .filter(|r| r.completed && r.home != r.away)
        .filter(|r| index.contains_key(&r.home) && index.contains_key(&r.away))
        .collect();

    for result in &counted {
        let (home, away) = (result.home_total(), result.away_total());
        rows[index[&result.home]].record(home, away);
        rows[index[&result.away]].record(away, home);
    }

    rows.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()).then(a.team_id.cmp(&b.team_id)));

    let mut ordered = Vec::with_capacity(rows.len());
    let mut start = 0;
    while start < rows.len() {
        let key = rows[start].sort_key();
        let end = rows[start..]
            .iter()
            .position(|row| row.sort_key() != key)
            .map_or(rows.len(), |offset| start + offset);

        let mut tied: Vec<StandingRow> = rows[start..end].to_vec();
        if tied.len() > 1 {
            resolve_tie(tournament_id, group, &mut tied, &counted);
        }
        ordered.extend(tied);
        start = end;
    }

    for (position, row) in ordered.iter_mut().enumerate() {
        row.rank = position as u32 + 1;
    }

    ordered
}

/// Rank every group present on the roster, ordered by group label
pub fn rank_groups(
    tournament_id: TournamentId,
    teams: &[Team],
    results: &[MatchResult],
) -> Vec<GroupStandings> {
    group_labels(teams)
        .into_iter()
        .map(|group| {
            let rows = rank_group(tournament_id, &group, teams, results);
            GroupStandings { group, rows }
        })
        .collect()
}

/// Distinct group labels of a roster, sorted
pub fn group_labels(teams: &[Team]) -> Vec<String> {
    teams
        .iter()
        .map(|t| t.group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unordered pairs of teams that have already met in a completed match
pub fn played_pairs(results: &[MatchResult]) -> BTreeSet<(TeamId, TeamId)> {
    results
        .iter()
        .filter(|r| r.completed && r.home != r.away)
        .map(|r| (r.home.min(r.away), r.home.max(r.away)))
        .collect()
}

fn resolve_tie(
    tournament_id: TournamentId,
    group: &str,
    tied: &mut [StandingRow],
    results: &[&MatchResult],
) {
    if tied.len() == 2 {
        let (a, b) = (tied[0].team_id, tied[1].team_id);
        if let Some(order) = head_to_head(a, b, results) {
            if order == Ordering::Less {
                tied.swap(0, 1);
            }
            for row in tied.iter_mut() {
                row.tie_break = Some(TieBreakReason::HeadToHead);
            }
            return;
        }
    }

    let ids: Vec<TeamId> = tied.iter().map(|row| row.team_id).collect();
    tied.sort_by_key(|row| (lottery_key(tournament_id, &ids, row.team_id), row.team_id));
    for row in tied.iter_mut() {
        row.tie_break = Some(TieBreakReason::Lottery);
    }

    log::debug!(
        "Group {}: lottery ordered tied teams {:?} as {:?}",
        group,
        ids,
        tied.iter().map(|row| row.team_id).collect::<Vec<_>>()
    );
}

/// Compare `a` against `b` on their mutual results: wins first, then goal
/// difference. `Greater` means `a` ranks above `b`; `None` means still level.
fn head_to_head(a: TeamId, b: TeamId, results: &[&MatchResult]) -> Option<Ordering> {
    let mut wins_a = 0u32;
    let mut wins_b = 0u32;
    let mut goals_a = 0i64;
    let mut goals_b = 0i64;

    for result in results.iter().filter(|r| r.involves_pair(a, b)) {
        let (scored_a, scored_b) = if result.home == a {
            (result.home_total(), result.away_total())
        } else {
            (result.away_total(), result.home_total())
        };
        goals_a += i64::from(scored_a);
        goals_b += i64::from(scored_b);
        match scored_a.cmp(&scored_b) {
            Ordering::Greater => wins_a += 1,
            Ordering::Less => wins_b += 1,
            Ordering::Equal => {}
        }
    }

    match wins_a.cmp(&wins_b) {
        Ordering::Equal => match goals_a.cmp(&goals_b) {
            Ordering::Equal => None,
            order => Some(order),
        },
        order => Some(order),
    }
}

/// SHA-256 digest of (tournament id, sorted tie set, team id).
///
/// The encoding is fixed-width big-endian with a length prefix for the tie
/// set, so the digest is identical across processes and platforms.
pub fn lottery_digest(tournament_id: TournamentId, tied: &[TeamId], team: TeamId) -> [u8; 32] {
    let sorted: BTreeSet<TeamId> = tied.iter().copied().collect();

    let mut hasher = Sha256::new();
    hasher.update(b"matchday-lottery-v1");
    hasher.update(tournament_id.to_be_bytes());
    hasher.update((sorted.len() as u64).to_be_bytes());
    for id in &sorted {
        hasher.update(id.to_be_bytes());
    }
    hasher.update(team.to_be_bytes());
    hasher.finalize().into()
}

/// Lottery draw for `team`: the first eight digest bytes as a big-endian integer.
/// Lower values rank higher.
pub fn lottery_key(tournament_id: TournamentId, tied: &[TeamId], team: TeamId) -> u64 {
    let digest = lottery_digest(tournament_id, tied, team);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Hex form of the lottery digest, for audit logs
pub fn lottery_digest_hex(tournament_id: TournamentId, tied: &[TeamId], team: TeamId) -> String {
    hex::encode(lottery_digest(tournament_id, tied, team))
}

/// Group standings keyed by label, for lookups by the final-day generators
pub fn by_group(standings: &[GroupStandings]) -> BTreeMap<&str, &GroupStandings> {
    standings.iter().map(|g| (g.group.as_str(), g)).collect()
}

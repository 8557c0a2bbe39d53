//! Value types shared by the ranking, scheduling and bracket components.
//!
//! Every type here is a plain immutable value. Nothing in this module talks to
//! storage; only the orchestrator loads and saves these records.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tournament ID type
pub type TournamentId = i64;

/// Team ID type
pub type TeamId = i64;

/// A registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team ID
    pub id: TeamId,
    /// Display name
    pub name: String,
    /// Group label (e.g. "A")
    pub group: String,
    /// Registration slot within the group, lower means registered earlier
    pub slot: u32,
}

impl Team {
    /// Create a new team
    pub fn new(id: TeamId, name: impl Into<String>, group: impl Into<String>, slot: u32) -> Self {
        Self {
            id,
            name: name.into(),
            group: group.into(),
            slot,
        }
    }
}

/// Goals scored by one side, split by half
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfScore {
    pub first_half: u32,
    pub second_half: u32,
}

impl HalfScore {
    pub fn new(first_half: u32, second_half: u32) -> Self {
        Self {
            first_half,
            second_half,
        }
    }

    /// Total goals over both halves
    pub fn total(&self) -> u32 {
        self.first_half + self.second_half
    }
}

/// Result of a played (or scheduled) match.
///
/// Results are never patched in place: a correction is a new value produced by
/// [`MatchResult::corrected`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Home team
    pub home: TeamId,
    /// Away team
    pub away: TeamId,
    /// Home goals per half
    pub home_goals: HalfScore,
    /// Away goals per half
    pub away_goals: HalfScore,
    /// Penalty shootout score (home, away), knockout fixtures only
    pub penalties: Option<(u32, u32)>,
    /// Whether the result is final
    pub completed: bool,
}

/// Outcome of a match from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchResult {
    /// Create a completed result
    pub fn completed(
        home: TeamId,
        away: TeamId,
        home_goals: HalfScore,
        away_goals: HalfScore,
    ) -> Self {
        Self {
            home,
            away,
            home_goals,
            away_goals,
            penalties: None,
            completed: true,
        }
    }

    /// Create a completed result from full-time totals, all goals counted in
    /// the first half
    pub fn final_score(home: TeamId, away: TeamId, home_total: u32, away_total: u32) -> Self {
        Self::completed(
            home,
            away,
            HalfScore::new(home_total, 0),
            HalfScore::new(away_total, 0),
        )
    }

    /// Create a result for a fixture that has not finished yet
    pub fn pending(home: TeamId, away: TeamId) -> Self {
        Self {
            home,
            away,
            home_goals: HalfScore::default(),
            away_goals: HalfScore::default(),
            penalties: None,
            completed: false,
        }
    }

    /// Attach a penalty shootout score
    pub fn with_penalties(mut self, home: u32, away: u32) -> Self {
        self.penalties = Some((home, away));
        self
    }

    /// Produce a replacement result carrying corrected scores
    pub fn corrected(&self, home_goals: HalfScore, away_goals: HalfScore) -> Self {
        Self {
            home_goals,
            away_goals,
            ..self.clone()
        }
    }

    pub fn home_total(&self) -> u32 {
        self.home_goals.total()
    }

    pub fn away_total(&self) -> u32 {
        self.away_goals.total()
    }

    /// Regulation-time outcome, penalties ignored
    pub fn outcome(&self) -> MatchOutcome {
        match self.home_total().cmp(&self.away_total()) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
        }
    }

    /// Winner and loser of a knockout fixture, falling back to the shootout
    /// when regulation time is level. `None` when nothing separates the sides.
    pub fn decided(&self) -> Option<(TeamId, TeamId)> {
        match self.outcome() {
            MatchOutcome::HomeWin => Some((self.home, self.away)),
            MatchOutcome::AwayWin => Some((self.away, self.home)),
            MatchOutcome::Draw => match self.penalties {
                Some((h, a)) if h > a => Some((self.home, self.away)),
                Some((h, a)) if a > h => Some((self.away, self.home)),
                _ => None,
            },
        }
    }

    /// Whether this result is between the two given teams, in either order
    pub fn involves_pair(&self, a: TeamId, b: TeamId) -> bool {
        (self.home == a && self.away == b) || (self.home == b && self.away == a)
    }
}

/// Why a row's position was not settled by points, goal difference and goals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakReason {
    HeadToHead,
    Lottery,
}

impl fmt::Display for TieBreakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreakReason::HeadToHead => write!(f, "head-to-head"),
            TieBreakReason::Lottery => write!(f, "lottery"),
        }
    }
}

/// One row of a group table. Points and goal difference are always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub group: String,
    pub team_id: TeamId,
    /// 1-based position, assigned by the ranking function
    pub rank: u32,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub tie_break: Option<TieBreakReason>,
}

impl StandingRow {
    /// Empty row for a team that has not played yet
    pub fn empty(group: impl Into<String>, team_id: TeamId) -> Self {
        Self {
            group: group.into(),
            team_id,
            rank: 0,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            tie_break: None,
        }
    }

    /// won × 3 + drawn
    pub fn points(&self) -> u32 {
        self.won * 3 + self.drawn
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    /// Primary sort key: (points, goal difference, goals for)
    pub fn sort_key(&self) -> (u32, i64, u32) {
        (self.points(), self.goal_difference(), self.goals_for)
    }

    /// Seat string such as "A1"
    pub fn seed(&self) -> String {
        format!("{}{}", self.group, self.rank)
    }

    pub(crate) fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => self.won += 1,
            std::cmp::Ordering::Less => self.lost += 1,
            std::cmp::Ordering::Equal => self.drawn += 1,
        }
    }
}

/// Ordered standings of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStandings {
    pub group: String,
    pub rows: Vec<StandingRow>,
}

impl GroupStandings {
    /// Row at the given rank, if the group has one
    pub fn at_rank(&self, rank: u32) -> Option<&StandingRow> {
        self.rows.iter().find(|row| row.rank == rank)
    }
}

/// Two teams of one group that must not be scheduled against each other.
///
/// The constructor stores the ids in ascending order, so the pair compares
/// equal regardless of the order it was given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExclusionPair {
    group: String,
    low: TeamId,
    high: TeamId,
}

impl ExclusionPair {
    pub fn new(group: impl Into<String>, a: TeamId, b: TeamId) -> Self {
        Self {
            group: group.into(),
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn teams(&self) -> (TeamId, TeamId) {
        (self.low, self.high)
    }

    pub fn excludes(&self, a: TeamId, b: TeamId) -> bool {
        self.low == a.min(b) && self.high == a.max(b)
    }
}

/// Tournament stage a fixture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Preliminary,
    Quarterfinal,
    Semifinal,
    ThirdPlace,
    Final,
    Training,
}

impl Stage {
    /// Bracket and training stages, everything generated for the final day
    pub const FINAL_DAY: [Stage; 5] = [
        Stage::Quarterfinal,
        Stage::Semifinal,
        Stage::ThirdPlace,
        Stage::Final,
        Stage::Training,
    ];

    pub fn is_bracket(&self) -> bool {
        matches!(
            self,
            Stage::Quarterfinal | Stage::Semifinal | Stage::ThirdPlace | Stage::Final
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preliminary => "preliminary",
            Stage::Quarterfinal => "quarterfinal",
            Stage::Semifinal => "semifinal",
            Stage::ThirdPlace => "third-place",
            Stage::Final => "final",
            Stage::Training => "training",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preliminary" => Ok(Stage::Preliminary),
            "quarterfinal" => Ok(Stage::Quarterfinal),
            "semifinal" => Ok(Stage::Semifinal),
            "third-place" => Ok(Stage::ThirdPlace),
            "final" => Ok(Stage::Final),
            "training" => Ok(Stage::Training),
            other => Err(format!("Unknown stage: {}", other)),
        }
    }
}

/// Which side of a finished fixture a placeholder refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner,
    Loser,
}

/// Identifies a fixture within a tournament: stage plus 1-based number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FixtureKey {
    pub stage: Stage,
    pub number: u32,
}

impl FixtureKey {
    pub fn new(stage: Stage, number: u32) -> Self {
        Self { stage, number }
    }
}

impl fmt::Display for FixtureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.stage, self.number)
    }
}

/// Stand-in for a participant decided by an earlier bracket fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placeholder {
    pub source: FixtureKey,
    pub outcome: Outcome,
}

impl Placeholder {
    pub fn winner(stage: Stage, number: u32) -> Self {
        Self {
            source: FixtureKey::new(stage, number),
            outcome: Outcome::Winner,
        }
    }

    pub fn loser(stage: Stage, number: u32) -> Self {
        Self {
            source: FixtureKey::new(stage, number),
            outcome: Outcome::Loser,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Outcome::Winner => "winner",
            Outcome::Loser => "loser",
        };
        write!(f, "{} {}", self.source, outcome)
    }
}

/// A fixture participant: a known team or a placeholder awaiting reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Participant {
    Team(TeamId),
    Placeholder(Placeholder),
}

impl Participant {
    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Participant::Team(id) => Some(*id),
            Participant::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Participant::Placeholder(_))
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Team(id) => write!(f, "team {}", id),
            Participant::Placeholder(p) => write!(f, "{}", p),
        }
    }
}

/// A fixture produced by one of the generators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFixture {
    pub stage: Stage,
    /// 1-based number within the stage
    pub number: u32,
    /// Group label, preliminary fixtures only
    pub group: Option<String>,
    pub venue: String,
    pub kickoff: NaiveDateTime,
    pub home: Participant,
    pub away: Participant,
    /// Training fixture between teams that already met
    pub rematch: bool,
}

impl GeneratedFixture {
    pub fn key(&self) -> FixtureKey {
        FixtureKey::new(self.stage, self.number)
    }

    /// True once both participants are concrete teams
    pub fn is_resolved(&self) -> bool {
        !self.home.is_placeholder() && !self.away.is_placeholder()
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home.team_id() == Some(team) || self.away.team_id() == Some(team)
    }
}

/// Kickoff base times for each bracket stage. Fixtures within a stage are
/// spaced by the tournament's slot interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketKickoffs {
    pub quarterfinal: NaiveTime,
    pub semifinal: NaiveTime,
    pub third_place: NaiveTime,
    pub final_match: NaiveTime,
}

impl BracketKickoffs {
    pub fn for_stage(&self, stage: Stage) -> Option<NaiveTime> {
        match stage {
            Stage::Quarterfinal => Some(self.quarterfinal),
            Stage::Semifinal => Some(self.semifinal),
            Stage::ThirdPlace => Some(self.third_place),
            Stage::Final => Some(self.final_match),
            Stage::Preliminary | Stage::Training => None,
        }
    }
}

impl Default for BracketKickoffs {
    fn default() -> Self {
        Self {
            quarterfinal: hm(10, 0),
            semifinal: hm(13, 0),
            third_place: hm(15, 0),
            final_match: hm(16, 30),
        }
    }
}

/// Slot plan for the preliminary round-robin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlan {
    /// Kickoff of the very first preliminary fixture
    pub first_kickoff: NaiveDateTime,
    /// Minutes between consecutive kickoffs on one day
    pub interval_minutes: i64,
    /// Fixtures played per day before rolling over to the next day
    pub fixtures_per_day: usize,
    /// Venue for preliminary fixtures
    pub venue: String,
}

impl SlotPlan {
    /// Kickoff time of the `index`-th fixture (0-based)
    pub fn kickoff_at(&self, index: usize) -> NaiveDateTime {
        let per_day = self.fixtures_per_day.max(1);
        let day = (index / per_day) as i64;
        let slot = (index % per_day) as i64;
        self.first_kickoff + Duration::days(day) + Duration::minutes(slot * self.interval_minutes)
    }
}

/// Tournament configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Declared number of groups
    pub group_count: usize,
    /// Declared number of teams per group
    pub teams_per_group: usize,
    /// Maximum training fixtures per team on the final day
    pub training_quota: usize,
    /// Training venues in assignment order
    pub training_venues: Vec<String>,
    /// Training kickoff template, in order
    pub training_kickoffs: Vec<NaiveTime>,
    /// Minutes between consecutive final-day slots
    pub slot_interval_minutes: i64,
    /// Venue hosting every bracket fixture
    pub finals_venue: String,
    /// Bracket kickoff base times
    pub bracket_kickoffs: BracketKickoffs,
    /// Date of the final day
    pub final_day: Option<NaiveDate>,
    /// Preliminary round-robin slots
    pub preliminary: SlotPlan,
}

impl TournamentConfig {
    /// A typical youth-cup configuration: 4 groups of 4, two training
    /// fixtures per team over two pitches
    pub fn standard(final_day: NaiveDate) -> Self {
        let first_day = final_day - Duration::days(2);
        Self {
            group_count: 4,
            teams_per_group: 4,
            training_quota: 2,
            training_venues: vec!["Pitch 1".to_string(), "Pitch 2".to_string()],
            training_kickoffs: vec![hm(9, 0), hm(10, 0), hm(11, 0), hm(12, 0)],
            slot_interval_minutes: 60,
            finals_venue: "Main Stadium".to_string(),
            bracket_kickoffs: BracketKickoffs::default(),
            final_day: Some(final_day),
            preliminary: SlotPlan {
                first_kickoff: first_day.and_time(hm(9, 0)),
                interval_minutes: 60,
                fixtures_per_day: 8,
                venue: "Main Stadium".to_string(),
            },
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Tournament record as loaded by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub id: TournamentId,
    pub name: String,
    pub config: TournamentConfig,
}

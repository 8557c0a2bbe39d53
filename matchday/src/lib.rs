//! # Matchday
//!
//! Scheduling and ranking engine for group-stage football tournaments.
//!
//! Teams play a preliminary round-robin inside their group. The final day
//! then holds a knockout bracket for the group winners and training fixtures
//! that cross the remaining teams between groups.
//!
//! ## Core Modules
//!
//! - [`standings`]: Group tables with head-to-head and lottery tie-breaks
//! - [`schedule`]: Preliminary round-robin fixtures with exclusions
//! - [`bracket`]: Knockout bracket for 2, 4 or 8 groups, and placeholder reconciliation
//! - [`training`]: Cross-group training pairings under a per-team quota
//! - [`orchestrator`]: Loads a tournament, runs the generators, writes the results
//! - [`db`]: PostgreSQL persistence
//!
//! The generators are plain functions over value types. Only the
//! orchestrator touches the database.
//!
//! ## Example
//!
//! ```
//! use matchday::{MatchResult, Team, standings::rank_group};
//!
//! let teams = vec![Team::new(1, "Rovers", "A", 1), Team::new(2, "United", "A", 2)];
//! let results = vec![MatchResult::final_score(1, 2, 2, 0)];
//!
//! let table = rank_group(1, "A", &teams, &results);
//! assert_eq!(table[0].team_id, 1);
//! assert_eq!(table[0].points(), 3);
//! ```

pub mod bracket;
pub mod db;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod schedule;
pub mod standings;
pub mod training;

pub use errors::{ConfigurationError, PreconditionError, ScheduleError, ScheduleResult, Warning};
pub use models::{
    ExclusionPair, FixtureKey, GeneratedFixture, GroupStandings, HalfScore, MatchResult, Outcome,
    Participant, Placeholder, Stage, StandingRow, Team, TeamId, TieBreakReason, TournamentConfig,
    TournamentId, TournamentInfo,
};
pub use orchestrator::{GenerationReport, ScheduleManager};

//! Error and warning types.
//!
//! Pure generators report recoverable conditions as [`Warning`]s next to their
//! output. Only orchestration-level preconditions abort an operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{FixtureKey, TeamId, TournamentId};

/// Configuration problems. Reported per unit of work; unaffected units still proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Unsupported bracket group count: {0} (supported: 2, 4, 8)")]
    UnsupportedBracketGroupCount(usize),

    #[error("Final-day date is not configured")]
    MissingFinalDay,

    #[error("Group {group} has an odd team count ({teams}) and no bye policy")]
    OddTeamCount { group: String, teams: usize },

    #[error("No training venues configured")]
    NoTrainingVenues,

    #[error("Training kickoff template is empty")]
    EmptyKickoffTemplate,

    #[error("Invalid preliminary slot plan: {0}")]
    InvalidSlotPlan(String),
}

/// Hard refusals: the requested operation cannot run in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Prerequisite fixture {0} is not complete")]
    PrerequisiteIncomplete(FixtureKey),

    #[error("Prerequisite fixture {0} finished level with no shootout winner")]
    UndecidedResult(FixtureKey),

    #[error("Result for {fixture} does not match its participants")]
    ParticipantMismatch { fixture: FixtureKey },

    #[error("Fixture not found: {0}")]
    FixtureNotFound(FixtureKey),

    #[error("No groups found for tournament {0}")]
    NoGroups(TournamentId),
}

/// Non-fatal conditions that travel with a successful result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Warning {
    UnsupportedBracketSize { group_count: usize },
    UnsupportedTrainingGroupCount { group_count: usize },
    MissingSeed { group: String },
    Rematch { home: TeamId, away: TeamId },
    QuotaUnderfilled { team: TeamId, scheduled: usize, quota: usize },
    KickoffOverflow { venue: String, slot: usize },
    GroupCountMismatch { declared: usize, derived: usize },
    Configuration { message: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedBracketSize { group_count } => write!(
                f,
                "Bracket not generated: unsupported group count {} (supported: 2, 4, 8)",
                group_count
            ),
            Warning::UnsupportedTrainingGroupCount { group_count } => write!(
                f,
                "Training fixtures not generated: unsupported group count {}",
                group_count
            ),
            Warning::MissingSeed { group } => {
                write!(f, "Group {} has no first-placed team", group)
            }
            Warning::Rematch { home, away } => {
                write!(f, "Training fixture {} vs {} is a rematch", home, away)
            }
            Warning::QuotaUnderfilled {
                team,
                scheduled,
                quota,
            } => write!(
                f,
                "Team {} has {} of {} training fixtures",
                team, scheduled, quota
            ),
            Warning::KickoffOverflow { venue, slot } => write!(
                f,
                "Venue {} needs slot {} beyond the kickoff template",
                venue, slot
            ),
            Warning::GroupCountMismatch { declared, derived } => write!(
                f,
                "Configured group count {} differs from {} groups on the roster",
                declared, derived
            ),
            Warning::Configuration { message } => write!(f, "{}", message),
        }
    }
}

impl From<ConfigurationError> for Warning {
    fn from(err: ConfigurationError) -> Self {
        match err {
            ConfigurationError::UnsupportedBracketGroupCount(group_count) => {
                Warning::UnsupportedBracketSize { group_count }
            }
            other => Warning::Configuration {
                message: other.to_string(),
            },
        }
    }
}

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ScheduleError {
    /// Message safe to show to API clients
    pub fn client_message(&self) -> String {
        match self {
            ScheduleError::Database(_) | ScheduleError::Serialization(_) => {
                "Internal server error".to_string()
            }
            ScheduleError::NotFound(_) => "Tournament not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for orchestrator operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

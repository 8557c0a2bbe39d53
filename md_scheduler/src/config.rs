//! Scheduler configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use matchday::{
    TournamentId,
    db::{DatabaseConfig, config::parse_env_or},
};
use std::time::Duration;

/// Complete command configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Tournament the command operates on, absent for `migrate`
    pub tournament_id: Option<TournamentId>,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Upper bound for one orchestrator operation, in seconds
    pub operation_timeout_secs: u64,
}

impl SchedulerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `tournament_override` - Optional tournament id (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if the tournament id is set but malformed
    pub fn from_env(
        tournament_override: Option<TournamentId>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let tournament_id = match tournament_override {
            Some(id) => Some(id),
            None => match std::env::var("MATCHDAY_TOURNAMENT_ID") {
                Ok(raw) => Some(parse_tournament_id(&raw)?),
                Err(_) => None,
            },
        };

        let database = match database_url_override {
            Some(url) => DatabaseConfig::with_url(url),
            None => DatabaseConfig::from_env().unwrap_or_default(),
        };

        Ok(SchedulerConfig {
            tournament_id,
            database,
            operation_timeout_secs: parse_env_or("MATCHDAY_OPERATION_TIMEOUT_SECS", 60),
        })
    }

    /// Tournament id for commands that operate on one tournament
    pub fn tournament(&self) -> Result<TournamentId, ConfigError> {
        self.tournament_id.ok_or_else(|| ConfigError::MissingRequired {
            var: "MATCHDAY_TOURNAMENT_ID".to_string(),
            hint: "Pass --tournament <ID> or set it in .env".to_string(),
        })
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament_id.is_some_and(|id| id <= 0) {
            return Err(ConfigError::Invalid {
                var: "MATCHDAY_TOURNAMENT_ID".to_string(),
                reason: "Must be a positive id".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "MATCHDAY_OPERATION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_tournament_id(raw: &str) -> Result<TournamentId, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: "MATCHDAY_TOURNAMENT_ID".to_string(),
        reason: format!("'{}' is not an integer", raw),
    })
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

//! PostgreSQL storage for tournaments, fixtures, results and standings.
//!
//! Ranking and generation never touch this module; only the orchestrator
//! loads and saves, through [`ScheduleRepository`].

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod repository;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use repository::{PgScheduleRepository, ScheduleRepository};

/// Pooled PostgreSQL handle shared by the scheduler's repositories
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool sized and timed by `config`.
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use matchday::ScheduleManager;
    /// use matchday::db::{Database, DatabaseConfig, PgScheduleRepository};
    ///
    /// # async fn connect() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::new(&DatabaseConfig::development()).await?;
    /// db.migrate().await?;
    /// let manager = ScheduleManager::new(Arc::new(PgScheduleRepository::new(db.pool().clone())));
    /// manager.generate_final_day(1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

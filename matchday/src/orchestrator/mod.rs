//! Schedule orchestration.
//!
//! [`ScheduleManager`] loads a tournament through a [`ScheduleRepository`],
//! runs the pure generators and writes their output back. Warnings from the
//! generators are returned in the report; only missing data or a hard
//! configuration problem aborts an operation.
//!
//! ## Example
//!
//! ```no_run
//! use matchday::db::{Database, PgScheduleRepository};
//! use matchday::orchestrator::ScheduleManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let repository = Arc::new(PgScheduleRepository::new(db.pool().clone()));
//!     let manager = ScheduleManager::new(repository);
//!
//!     let report = manager.generate_final_day(1).await?;
//!     println!("{} fixtures, {} warnings", report.fixtures.len(), report.warnings.len());
//!
//!     Ok(())
//! }
//! ```

pub mod manager;

pub use manager::{GenerationReport, ScheduleManager};

//! Structured logging configuration.
//!
//! The library logs through the `log` facade; those records are forwarded
//! into the tracing subscriber installed here.

use matchday::TournamentId;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use md_scheduler::logging;
///
/// logging::init();
/// tracing::info!("Scheduler starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    // Reports go to stdout, so logs stay on stderr
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

/// Log how long an orchestrator operation took
pub fn log_operation(operation: &str, tournament_id: Option<TournamentId>, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if duration_ms > 5000 {
        tracing::warn!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Slow schedule operation"
        );
    } else {
        tracing::info!(
            operation = operation,
            tournament_id = tournament_id,
            duration_ms = duration_ms,
            "Schedule operation finished"
        );
    }
}

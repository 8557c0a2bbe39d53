//! Operator command for tournament scheduling.
//!
//! Connects to PostgreSQL, runs one schedule operation for one tournament
//! and prints the result as JSON on stdout. `migrate` needs no tournament.

mod cli;
mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Error};
use log::info;
use matchday::{
    ScheduleError, ScheduleManager,
    db::{Database, PgScheduleRepository},
};
use pico_args::Arguments;

use cli::{Args, Command, HELP};
use config::SchedulerConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args::parse(pargs)?;

    logging::init();

    let config = SchedulerConfig::from_env(args.tournament, args.database_url)?;
    config.validate()?;
    if args.command != Command::Migrate {
        config.tournament()?;
    }

    info!("Connecting to database");
    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.health_check().await.context("Database health check failed")?;

    let started = Instant::now();
    let output = tokio::time::timeout(config.operation_timeout(), run(&db, &config, args.command))
        .await
        .map_err(|_| ScheduleError::Timeout(config.operation_timeout()))??;
    logging::log_operation(args.command.name(), config.tournament_id, started.elapsed());

    println!("{}", serde_json::to_string_pretty(&output)?);

    db.close().await;
    Ok(())
}

async fn run(
    db: &Database,
    config: &SchedulerConfig,
    command: Command,
) -> Result<serde_json::Value, Error> {
    let output = match command {
        Command::Migrate => {
            db.migrate().await.context("Failed to apply migrations")?;
            serde_json::json!({ "migrated": true })
        }
        Command::Standings => {
            let standings = manager(db).recalculate_standings(config.tournament()?).await?;
            serde_json::to_value(standings)?
        }
        Command::Preliminary => {
            let report = manager(db).generate_preliminary(config.tournament()?).await?;
            serde_json::to_value(report)?
        }
        Command::FinalDay => {
            let report = manager(db).generate_final_day(config.tournament()?).await?;
            serde_json::to_value(report)?
        }
        Command::Reconcile { stage, number } => {
            let fixture = manager(db)
                .reconcile_fixture(config.tournament()?, stage, number)
                .await?;
            serde_json::to_value(fixture)?
        }
    };

    Ok(output)
}

fn manager(db: &Database) -> ScheduleManager {
    ScheduleManager::new(Arc::new(PgScheduleRepository::new(db.pool().clone())))
}

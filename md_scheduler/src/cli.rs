//! Command-line parsing.

use matchday::{Stage, TournamentId};
use pico_args::Arguments;

pub const HELP: &str = "\
Run matchday schedule operations for one tournament

USAGE:
  md_scheduler [OPTIONS] <COMMAND>

COMMANDS:
  migrate                  Apply database migrations
  standings                Recalculate and store group standings
  preliminary              Regenerate the preliminary round-robin
  final-day                Regenerate bracket and training fixtures
  reconcile                Fill in a bracket fixture from finished results
      --stage  STAGE       quarterfinal | semifinal | third-place | final
      --number N           Fixture number within the stage

OPTIONS:
  --tournament ID          Tournament id, not needed for migrate
                           [default: env MATCHDAY_TOURNAMENT_ID]
  --db-url     URL         Database connection string
                           [default: env DATABASE_URL or postgres://postgres@localhost/matchday]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL                     PostgreSQL connection string
  MATCHDAY_TOURNAMENT_ID           Tournament id
  MATCHDAY_OPERATION_TIMEOUT_SECS  Abort an operation after this many seconds [default: 60]
  RUST_LOG                         Log filter [default: info,sqlx=warn]
";

/// Operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Migrate,
    Standings,
    Preliminary,
    FinalDay,
    Reconcile { stage: Stage, number: u32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Migrate => "migrate",
            Command::Standings => "standings",
            Command::Preliminary => "preliminary",
            Command::FinalDay => "final-day",
            Command::Reconcile { .. } => "reconcile",
        }
    }
}

/// Parsed arguments
#[derive(Debug)]
pub struct Args {
    pub command: Command,
    pub tournament: Option<TournamentId>,
    pub database_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("No command given, see --help")]
    MissingCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unexpected arguments: {0:?}")]
    Unexpected(Vec<std::ffi::OsString>),

    #[error(transparent)]
    Parse(#[from] pico_args::Error),
}

impl Args {
    pub fn parse(mut pargs: Arguments) -> Result<Self, ArgsError> {
        let tournament = pargs.opt_value_from_str("--tournament")?;
        let database_url = pargs.opt_value_from_str("--db-url")?;

        let command = match pargs.subcommand()?.as_deref() {
            Some("migrate") => Command::Migrate,
            Some("standings") => Command::Standings,
            Some("preliminary") => Command::Preliminary,
            Some("final-day") => Command::FinalDay,
            Some("reconcile") => Command::Reconcile {
                stage: pargs.value_from_str("--stage")?,
                number: pargs.value_from_str("--number")?,
            },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
            None => return Err(ArgsError::MissingCommand),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(ArgsError::Unexpected(remaining));
        }

        Ok(Args {
            command,
            tournament,
            database_url,
        })
    }
}

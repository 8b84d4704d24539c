use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use clap::{ArgMatches, parser::ValueSource};
use std::path::PathBuf;
use tracing::Level;

const DEFAULT_LEVEL: Level = Level::INFO;

/// Map verbosity (flag count or `TRACKER_LOG_LEVEL`) to tracing level
const fn get_verbosity_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Level requested on the command line or in the environment, `INFO` otherwise
fn verbosity_level(matches: &ArgMatches) -> Level {
    let requested = matches
        .value_source(commands::logging::ARG_VERBOSITY)
        .is_some_and(|source| source != ValueSource::DefaultValue);

    match matches.get_one::<u8>(commands::logging::ARG_VERBOSITY) {
        Some(verbosity) if requested => get_verbosity_level(*verbosity),
        _ => DEFAULT_LEVEL,
    }
}

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if argument parsing, telemetry initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    // values from .env act as environment fallbacks
    let _ = dotenvy::dotenv();

    let matches = commands::new().get_matches();

    let log_dir = matches
        .get_one::<PathBuf>(commands::logging::ARG_LOG_DIR)
        .cloned();

    telemetry::init(verbosity_level(&matches), log_dir.as_deref())?;

    dispatch::handler(&matches)
}

use crate::cli::commands::{self, logging::LogOptions};
use crate::cli::{actions::Action, dispatch, telemetry};
use anyhow::Result;

/// Parse the command line, install logging and resolve the action to run.
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the arguments do not
/// describe a runnable action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();
    telemetry::init(LogOptions::parse(&matches))?;
    dispatch::handler(&matches)
}

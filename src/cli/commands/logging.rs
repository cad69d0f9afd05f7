//! Log verbosity and format flags shared by every subcommand.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_JSON: &str = "log-json";

/// Level names in verbosity order; the index is the `-v` count.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

/// Accepts a level name or a numeric verbosity (0-5) from `CLASSGATE_LOG_LEVEL`.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|raw: &str| -> Result<u8, String> {
        if let Some(count) = raw.parse::<u8>().ok().filter(|count| *count <= 5) {
            return Ok(count);
        }
        LEVELS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(raw))
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| {
                format!("unknown log level `{raw}`, expected error|warn|info|debug|trace")
            })
    })
}

/// Level for a verbosity count; anything past the table is TRACE.
#[must_use]
pub fn level_for(count: u8) -> Level {
    LEVELS
        .get(usize::from(count))
        .map_or(Level::TRACE, |(_, level)| *level)
}

/// Resolved logging settings for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    pub level: Level,
    pub json: bool,
}

impl LogOptions {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let count = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
        Self {
            level: level_for(count),
            json: matches.get_flag(ARG_LOG_JSON),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Raise log detail, repeat up to -vvvv (or set a level name in the env)")
                .env("CLASSGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_JSON)
                .long(ARG_LOG_JSON)
                .help("Write log events to stderr as JSON lines")
                .env("CLASSGATE_LOG_JSON")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}

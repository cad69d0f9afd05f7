use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

use crate::config::{AuthConfig, MAX_LOCKOUT_WINDOW_SECONDS, MAX_SESSION_TTL_SECONDS};

pub const ARG_STORE: &str = "store";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_MAX_ATTEMPTS: &str = "max-attempts";
pub const ARG_LOCKOUT_WINDOW_SECONDS: &str = "lockout-window-seconds";
pub const ARG_PASSWORD_PEPPER: &str = "password-pepper";
pub const ARG_JSON: &str = "json";

#[derive(Debug, Clone)]
pub struct Options {
    pub store: String,
    pub json: bool,
    pub config: AuthConfig,
}

impl Options {
    /// Parse store and auth tuning arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a value is missing or out of range.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let store = matches
            .get_one::<String>(ARG_STORE)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_STORE}"))?;

        let seconds = |id: &str| -> anyhow::Result<i64> {
            matches
                .get_one::<i64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        let max_attempts = matches
            .get_one::<u32>(ARG_MAX_ATTEMPTS)
            .copied()
            .filter(|attempts| *attempts > 0)
            .ok_or_else(|| anyhow::anyhow!("--{ARG_MAX_ATTEMPTS} must be greater than zero"))?;

        let pepper = matches
            .get_one::<String>(ARG_PASSWORD_PEPPER)
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.clone()));

        let config = AuthConfig::new()
            .with_max_attempts(max_attempts)
            .with_lockout_window_seconds(seconds(ARG_LOCKOUT_WINDOW_SECONDS)?)
            .with_session_ttl_seconds(seconds(ARG_SESSION_TTL_SECONDS)?)
            .with_password_pepper(pepper);

        Ok(Self {
            store,
            json: matches.get_flag(ARG_JSON),
            config,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORE)
                .short('s')
                .long(ARG_STORE)
                .help("Path to the JSON file holding users and the current session")
                .env("CLASSGATE_STORE")
                .default_value("classgate.json")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds (at most 30 days), renewed on every validated access")
                .env("CLASSGATE_SESSION_TTL_SECONDS")
                .default_value("3600")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Failed logins allowed per email before lockout")
                .env("CLASSGATE_MAX_ATTEMPTS")
                .default_value("5")
                .global(true)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_WINDOW_SECONDS)
                .long(ARG_LOCKOUT_WINDOW_SECONDS)
                .help("Lockout window in seconds (at most one day)")
                .env("CLASSGATE_LOCKOUT_WINDOW_SECONDS")
                .default_value("900")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..=MAX_LOCKOUT_WINDOW_SECONDS)),
        )
        .arg(
            Arg::new(ARG_PASSWORD_PEPPER)
                .long(ARG_PASSWORD_PEPPER)
                .help("Server-side secret mixed into password hashes")
                .env("CLASSGATE_PASSWORD_PEPPER")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_JSON)
                .long(ARG_JSON)
                .help("Print results as JSON")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}

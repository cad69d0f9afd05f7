//! Command-line argument dispatch.
//!
//! This module turns validated CLI matches into an `Action` carrying the
//! global store/auth settings plus the subcommand's own arguments.

use crate::cli::actions::{password, session, users, Action};
use crate::cli::commands::{auth, session as session_cmd, users as users_cmd};
use crate::cli::globals::GlobalArgs;
use crate::permission::Role;
use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    required(matches, id).map(SecretString::from)
}

fn new_user(globals: GlobalArgs, matches: &ArgMatches, role: String) -> Result<users::NewUserArgs> {
    Ok(users::NewUserArgs {
        globals,
        username: required(matches, users_cmd::ARG_USERNAME)?,
        email: required(matches, session_cmd::ARG_EMAIL)?,
        password: secret(matches, session_cmd::ARG_PASSWORD)?,
        display_name: required(matches, users_cmd::ARG_DISPLAY_NAME)?,
        role,
    })
}

fn user_action(globals: GlobalArgs, matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((users_cmd::CMD_USER_ADD, sub)) => {
            let role = required(sub, session_cmd::ARG_ROLE)?;
            Ok(Action::UserAdd(new_user(globals, sub, role)?))
        }
        Some((users_cmd::CMD_USER_LIST, _)) => Ok(Action::UserList(globals)),
        Some((users_cmd::CMD_USER_DELETE, sub)) => Ok(Action::UserDelete {
            globals,
            id: sub
                .get_one::<u64>(users_cmd::ARG_ID)
                .copied()
                .context("missing required argument: <id>")?,
        }),
        Some((users_cmd::CMD_USER_RESET_PASSWORD, sub)) => {
            Ok(Action::UserResetPassword(password::ResetArgs {
                globals,
                email: required(sub, session_cmd::ARG_EMAIL)?,
                password: secret(sub, session_cmd::ARG_PASSWORD)?,
            }))
        }
        Some((name, _)) => anyhow::bail!("unknown user subcommand: {name}"),
        None => anyhow::bail!("missing user subcommand"),
    }
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or a role name is not
/// one of the supported roles.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let options = auth::Options::parse(matches)?;
    let globals = GlobalArgs::new(options.store)
        .with_config(options.config)
        .with_json(options.json);

    match matches.subcommand() {
        Some((users_cmd::CMD_BOOTSTRAP, sub)) => Ok(Action::Bootstrap(new_user(
            globals,
            sub,
            Role::Administrator.to_string(),
        )?)),
        Some((session_cmd::CMD_LOGIN, sub)) => Ok(Action::Login(session::LoginArgs {
            globals,
            email: required(sub, session_cmd::ARG_EMAIL)?,
            password: secret(sub, session_cmd::ARG_PASSWORD)?,
            role: required(sub, session_cmd::ARG_ROLE)?,
        })),
        Some((session_cmd::CMD_LOGOUT, _)) => Ok(Action::Logout(globals)),
        Some((session_cmd::CMD_SESSION, _)) => Ok(Action::Session(globals)),
        Some((session_cmd::CMD_EXTEND, sub)) => Ok(Action::Extend {
            globals,
            minutes: sub
                .get_one::<i64>(session_cmd::ARG_MINUTES)
                .copied()
                .unwrap_or(0),
        }),
        Some((session_cmd::CMD_WHOAMI, _)) => Ok(Action::Whoami(globals)),
        Some((session_cmd::CMD_PASSWD, sub)) => Ok(Action::Passwd(password::Args {
            globals,
            current: secret(sub, session_cmd::ARG_CURRENT_PASSWORD)?,
            new: secret(sub, session_cmd::ARG_NEW_PASSWORD)?,
        })),
        Some((session_cmd::CMD_PERMISSIONS, sub)) => {
            let role = sub
                .get_one::<String>(session_cmd::ARG_ROLE)
                .map(|name| name.parse::<Role>())
                .transpose()
                .context("cannot describe permissions")?;
            Ok(Action::Permissions { globals, role })
        }
        Some((users_cmd::CMD_USER, sub)) => user_action(globals, sub),
        Some((name, _)) => anyhow::bail!("unknown subcommand: {name}"),
        None => anyhow::bail!("missing subcommand"),
    }
}

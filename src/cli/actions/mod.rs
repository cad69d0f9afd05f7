pub mod password;
pub mod session;
pub mod users;

// Internal interpreter for `Action`; keeps this module small as commands grow.
mod run;

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::admin::UserAdministration;
use crate::auth::AuthenticationEngine;
use crate::cli::globals::GlobalArgs;
use crate::clock::SystemClock;
use crate::directory::JsonFileStore;
use crate::error::AuthError;
use crate::permission::Role;
use crate::session::SessionManager;
use crate::validator::DefaultValidator;

#[derive(Debug)]
pub enum Action {
    Bootstrap(users::NewUserArgs),
    Login(session::LoginArgs),
    Logout(GlobalArgs),
    Session(GlobalArgs),
    Extend { globals: GlobalArgs, minutes: i64 },
    Whoami(GlobalArgs),
    Passwd(password::Args),
    Permissions { globals: GlobalArgs, role: Option<Role> },
    UserAdd(users::NewUserArgs),
    UserList(GlobalArgs),
    UserDelete { globals: GlobalArgs, id: u64 },
    UserResetPassword(password::ResetArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub fn execute(self) -> Result<()> {
        run::execute(self)
    }
}

/// The wired service graph for one CLI invocation.
pub struct Services {
    pub auth: Arc<AuthenticationEngine>,
    pub sessions: SessionManager,
    pub admin: UserAdministration,
}

impl Services {
    #[must_use]
    pub fn open(globals: &GlobalArgs) -> Self {
        let store = Arc::new(JsonFileStore::new(globals.store.clone()));
        let auth = Arc::new(AuthenticationEngine::new(
            store.clone(),
            Arc::new(DefaultValidator),
            Arc::new(SystemClock),
            &globals.config,
        ));
        Self {
            sessions: SessionManager::new(auth.clone(), store, &globals.config),
            admin: UserAdministration::new(auth.clone()),
            auth,
        }
    }
}

/// Render an outcome as `message (CODE)` for the terminal.
pub(crate) fn outcome<T>(result: Result<T, AuthError>) -> Result<T> {
    result.map_err(|err| anyhow!("{err} ({})", err.code()))
}

pub(crate) fn emit<T: Serialize>(
    globals: &GlobalArgs,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    if globals.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_carries_code() {
        let result: Result<(), AuthError> = Err(AuthError::RoleMismatch);
        let err = outcome(result).err().map(|err| err.to_string());
        assert_eq!(
            err,
            Some("Role does not match this account (ROLE_MISMATCH)".to_string())
        );
    }
}

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use super::{emit, outcome, Services};
use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub current: SecretString,
    pub new: SecretString,
}

#[derive(Debug)]
pub struct ResetArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

pub(super) fn change(args: Args) -> Result<()> {
    let services = Services::open(&args.globals);
    let account = outcome(services.sessions.current_account())?;
    outcome(services.auth.change_password(
        account.id(),
        args.current.expose_secret(),
        args.new.expose_secret(),
    ))?;
    emit(
        &args.globals,
        &serde_json::json!({ "password_changed": true }),
        || "Password changed".to_string(),
    )
}

pub(super) fn reset(args: ResetArgs) -> Result<()> {
    let services = Services::open(&args.globals);
    let actor = outcome(services.sessions.current_account())?;
    outcome(services.admin.reset_password(
        &actor,
        &args.email,
        args.password.expose_secret(),
    ))?;
    emit(
        &args.globals,
        &serde_json::json!({ "password_reset": args.email }),
        || format!("Password reset for {}", args.email),
    )
}

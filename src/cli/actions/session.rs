use anyhow::Result;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{emit, outcome, Services};
use crate::cli::globals::GlobalArgs;
use crate::identity::UserId;
use crate::permission::{permissions_for, Role};
use crate::session::Session;

#[derive(Debug)]
pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub role: String,
}

/// Session as shown to the user; the session id stays in the store.
#[derive(Debug, Serialize)]
struct SessionView {
    user_id: UserId,
    role: Role,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    remaining_seconds: i64,
}

impl SessionView {
    fn new(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
            created_at: session.created_at,
            last_activity: session.last_activity,
            expires_at: session.expires_at,
            remaining_seconds: session.remaining(now).num_seconds(),
        }
    }

    fn describe(&self) -> String {
        format!(
            "user {} ({}) session valid until {} ({} min left)",
            self.user_id,
            self.role,
            self.expires_at.to_rfc3339(),
            self.remaining_seconds / 60
        )
    }
}

pub(super) fn login(args: LoginArgs) -> Result<()> {
    let services = Services::open(&args.globals);
    let opened = outcome(services.sessions.login(
        &args.email,
        args.password.expose_secret(),
        &args.role,
    ))?;
    emit(&args.globals, &opened.login, || {
        format!(
            "{}\nredirect: {}\npermissions: {}",
            opened.login.message,
            opened.login.redirect_to,
            opened.login.permissions.tokens().join(", ")
        )
    })
}

pub(super) fn logout(globals: &GlobalArgs) -> Result<()> {
    let services = Services::open(globals);
    outcome(services.sessions.logout())?;
    emit(globals, &serde_json::json!({ "logged_out": true }), || {
        "Logged out".to_string()
    })
}

pub(super) fn show(globals: &GlobalArgs) -> Result<()> {
    let services = Services::open(globals);
    let session = outcome(services.sessions.validate_session())?;
    let view = SessionView::new(&session, services.auth.clock().now());
    emit(globals, &view, || view.describe())
}

pub(super) fn extend(globals: &GlobalArgs, minutes: i64) -> Result<()> {
    let services = Services::open(globals);
    outcome(services.sessions.validate_session())?;
    let session = outcome(services.sessions.extend_session(minutes))?;
    let view = SessionView::new(&session, services.auth.clock().now());
    emit(globals, &view, || view.describe())
}

pub(super) fn whoami(globals: &GlobalArgs) -> Result<()> {
    let services = Services::open(globals);
    let account = outcome(services.sessions.current_account())?;
    emit(globals, &account, || {
        let identity = account.identity();
        format!(
            "{} <{}> id={} role={} username={}",
            identity.display_name(),
            identity.email(),
            identity.id(),
            identity.role(),
            identity.username()
        )
    })
}

pub(super) fn permissions(globals: &GlobalArgs, role: Option<Role>) -> Result<()> {
    let role = match role {
        Some(role) => role,
        None => {
            let services = Services::open(globals);
            outcome(services.sessions.current_account())?.role()
        }
    };
    let permissions = permissions_for(role);
    emit(globals, &permissions, || {
        format!("{role}: {}", permissions.tokens().join(", "))
    })
}

//! # classgate
//!
//! Role-based authentication and session management for a school
//! application with administrator, teacher and student accounts.
//!
//! ## Permission model
//!
//! Each role maps to a fixed capability set. Administrators and teachers
//! share only `view_reports` and `manage_assignments`; students share
//! nothing with either. Every role action on a [`identity::UserAccount`] is
//! checked against this table first.
//!
//! ## Authentication
//!
//! [`auth::AuthenticationEngine`] validates input format, enforces a
//! per-email lockout (5 failures within 15 minutes by default) and verifies
//! Argon2id credentials. Lockout is checked before the user store is read,
//! so a locked email does not reveal whether the account exists.
//!
//! ## Sessions
//!
//! [`session::SessionManager`] keeps one current session per process,
//! mirrored into the store so it survives restarts. Every validated access
//! slides the expiry forward; expired or unverifiable sessions are destroyed
//! when detected.
//!
//! Services are constructed explicitly and shared through `Arc`: the engine
//! is built first and handed to the session manager.

pub mod admin;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod permission;
pub mod session;
pub mod validator;

pub use error::AuthError;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

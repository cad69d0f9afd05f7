//! Credential verification, lockout enforcement and password changes.
//!
//! Flow Overview (`authenticate`):
//! 1) Format validation. Rejections never touch the store or the lockout table.
//! 2) Lockout check. A locked email is refused before the store is consulted,
//!    so lockout never reveals whether the account exists.
//! 3) Lookup, role check, credential check. Each failure counts as an attempt.
//! 4) Success clears the attempt record and returns a role-typed account.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::lockout::{LoginAttemptRecord, LoginAttempts};
use super::password::CredentialHasher;
use super::types::LoginSuccess;
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::directory::{normalize_email, UserDirectory, UserPatch, UserRecord};
use crate::error::AuthError;
use crate::identity::{UserAccount, UserId};
use crate::permission::Role;
use crate::session::Session;
use crate::validator::CredentialValidator;

pub struct AuthenticationEngine {
    directory: Arc<dyn UserDirectory>,
    validator: Arc<dyn CredentialValidator>,
    clock: Arc<dyn Clock>,
    hasher: CredentialHasher,
    attempts: LoginAttempts,
}

impl AuthenticationEngine {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        validator: Arc<dyn CredentialValidator>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            directory,
            validator,
            clock,
            hasher: CredentialHasher::new(config.password_pepper().cloned()),
            attempts: LoginAttempts::new(config.max_attempts(), config.lockout_window()),
        }
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    #[must_use]
    pub fn validator(&self) -> &dyn CredentialValidator {
        self.validator.as_ref()
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Verify `email`/`password` for `claimed_role`.
    ///
    /// # Errors
    /// `InvalidFormat`, `Locked`, `UserNotFound`, `RoleMismatch` or
    /// `InvalidPassword`; `Internal` if the store is unreadable.
    #[instrument(skip(self, password), fields(role = %claimed_role))]
    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
        claimed_role: &str,
    ) -> Result<LoginSuccess, AuthError> {
        let verdict = self.validator.validate_login(email, password, claimed_role);
        if !verdict.accepted {
            return Err(AuthError::InvalidFormat {
                reasons: verdict.reasons,
            });
        }
        let email = normalize_email(email);
        let role = claimed_role.parse::<Role>().map_err(|err| AuthError::InvalidFormat {
            reasons: vec![err.to_string()],
        })?;

        let now = self.clock.now();
        if let Err(err) = self.attempts.check(&email, now) {
            warn!("login refused, {email} is locked out");
            return Err(err);
        }

        let Some(record) = self.directory.find_by_email(&email)? else {
            self.fail(&email, "unknown email");
            return Err(AuthError::UserNotFound);
        };

        if record.identity.role() != role {
            self.fail(&email, "role mismatch");
            return Err(AuthError::RoleMismatch);
        }

        if !self.hasher.verify(password, &record.password_hash) {
            self.fail(&email, "invalid password");
            return Err(AuthError::InvalidPassword);
        }

        self.attempts.clear(&email);
        let account = account_from(&record)?;
        info!(user_id = account.id(), "login succeeded for {email}");
        Ok(LoginSuccess::new(account))
    }

    fn fail(&self, email: &str, reason: &str) {
        let record = self.attempts.record_failure(email, self.clock.now());
        warn!(
            attempts = record.count,
            "login failed for {email}: {reason}"
        );
    }

    /// Change a password after proving knowledge of the current one.
    ///
    /// # Errors
    /// `UserNotFound`, `InvalidPassword` if `old_password` is wrong,
    /// `WeakPassword` if `new_password` fails validation.
    #[instrument(skip(self, old_password, new_password))]
    pub fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let record = self
            .directory
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;

        if !self.hasher.verify(old_password, &record.password_hash) {
            warn!("password change rejected, current password mismatch");
            return Err(AuthError::InvalidPassword);
        }

        self.store_password(user_id, new_password)?;
        info!("password changed");
        Ok(())
    }

    /// Administrator-triggered reset; skips the old-password check.
    ///
    /// # Errors
    /// `UserNotFound` or `WeakPassword`.
    #[instrument(skip(self, new_password))]
    pub fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AuthError> {
        let record = self
            .directory
            .find_by_email(&normalize_email(email))?
            .ok_or(AuthError::UserNotFound)?;

        self.store_password(record.identity.id(), new_password)?;
        info!(user_id = record.identity.id(), "password reset");
        Ok(())
    }

    fn store_password(&self, user_id: UserId, new_password: &str) -> Result<(), AuthError> {
        let verdict = self.validator.validate_password(new_password);
        if !verdict.accepted {
            return Err(AuthError::WeakPassword {
                reasons: verdict.reasons,
            });
        }
        let hash = self.hash_password(new_password)?;
        self.directory.update(user_id, UserPatch::password_hash(hash))?;
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::Internal` if hashing fails.
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        self.hasher
            .hash(password)
            .map_err(|err| AuthError::Internal(err.to_string()))
    }

    /// Secondary check used by the session manager: the identity behind the
    /// session must still exist with the same role.
    ///
    /// # Errors
    /// `VerificationFailed` when it does not; `Internal` if the store is unreadable.
    pub fn verify_session(&self, session: &Session) -> Result<UserAccount, AuthError> {
        match self.directory.find_by_id(session.user_id)? {
            Some(record) if record.identity.role() == session.role => account_from(&record),
            Some(_) => {
                warn!(user_id = session.user_id, "session role no longer matches");
                Err(AuthError::VerificationFailed)
            }
            None => {
                warn!(user_id = session.user_id, "session user no longer exists");
                Err(AuthError::VerificationFailed)
            }
        }
    }

    /// # Errors
    /// `UserNotFound` when no record has this id.
    pub fn account(&self, user_id: UserId) -> Result<UserAccount, AuthError> {
        let record = self
            .directory
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;
        account_from(&record)
    }

    /// # Errors
    /// `UserNotFound` when no record has this email.
    pub fn account_by_email(&self, email: &str) -> Result<UserAccount, AuthError> {
        let record = self
            .directory
            .find_by_email(&normalize_email(email))?
            .ok_or(AuthError::UserNotFound)?;
        account_from(&record)
    }

    /// Failed-attempt record for `email`, if one is still inside the window.
    #[must_use]
    pub fn attempts_for(&self, email: &str) -> Option<LoginAttemptRecord> {
        self.attempts
            .get(&normalize_email(email), self.clock.now())
    }

    pub fn clear_attempts(&self, email: &str) {
        self.attempts.clear(&normalize_email(email));
    }
}

fn account_from(record: &UserRecord) -> Result<UserAccount, AuthError> {
    UserAccount::from_record(record).map_err(|err| AuthError::Internal(err.to_string()))
}

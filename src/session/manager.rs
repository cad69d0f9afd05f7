use chrono::Duration;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use super::{expiry_after, generate_session_id, Session};
use crate::auth::{AuthenticationEngine, LoginSuccess};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::directory::SessionStore;
use crate::error::AuthError;
use crate::identity::UserAccount;
use crate::permission::Capability;

/// A successful login together with the session it opened.
#[derive(Debug, Clone, Serialize)]
pub struct SessionLogin {
    pub login: LoginSuccess,
    pub session: Session,
}

/// Owns the cached current session and its persisted mirror.
pub struct SessionManager {
    auth: Arc<AuthenticationEngine>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        auth: Arc<AuthenticationEngine>,
        store: Arc<dyn SessionStore>,
        config: &AuthConfig,
    ) -> Self {
        let clock = auth.clock().clone();
        Self {
            auth,
            store,
            clock,
            ttl: config.session_ttl(),
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthenticationEngine {
        &self.auth
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn cache(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authenticate and open a session for the resulting account.
    ///
    /// # Errors
    /// Any `authenticate` outcome, or `Internal` if the session cannot be stored.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<SessionLogin, AuthError> {
        let login = self.auth.authenticate(email, password, role)?;
        let session = self.create_session(&login.account)?;
        Ok(SessionLogin { login, session })
    }

    /// Start a fresh session for `account`, replacing any cached one.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if no id can be generated, the expiry is
    /// out of range or the store cannot be written.
    #[instrument(skip(self, account), fields(user_id = account.id()))]
    pub fn create_session(&self, account: &UserAccount) -> Result<Session, AuthError> {
        let session_id =
            generate_session_id().map_err(|err| AuthError::Internal(err.to_string()))?;
        let now = self.clock.now();
        let session = Session {
            session_id,
            user_id: account.id(),
            role: account.role(),
            created_at: now,
            last_activity: now,
            expires_at: expiry_after(now, self.ttl)?,
        };

        self.store.save_session(&session)?;
        *self.cache() = Some(session.clone());
        info!(role = %session.role, "session created");
        Ok(session)
    }

    /// Cached or persisted session, regardless of expiry. A loaded mirror is cached.
    fn load(&self) -> Result<Option<Session>, AuthError> {
        if let Some(session) = self.cache().clone() {
            return Ok(Some(session));
        }
        debug!("no cached session, reading persisted mirror");
        let persisted = self.store.load_session()?;
        if let Some(session) = &persisted {
            *self.cache() = Some(session.clone());
        }
        Ok(persisted)
    }

    /// The current session if one exists and has not expired.
    ///
    /// Never deletes anything; expired sessions are simply reported as absent.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if the store cannot be read.
    pub fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
        let now = self.clock.now();
        if let Some(session) = self.cache().clone() {
            if !session.is_expired(now) {
                return Ok(Some(session));
            }
        }
        let persisted = self.store.load_session()?;
        match persisted {
            Some(session) if !session.is_expired(now) => {
                *self.cache() = Some(session.clone());
                Ok(Some(session))
            }
            _ => Ok(None),
        }
    }

    fn validate(&self) -> Result<(Session, UserAccount), AuthError> {
        let Some(mut session) = self.load()? else {
            return Err(AuthError::NoSession);
        };

        let now = self.clock.now();
        if session.is_expired(now) {
            warn!(user_id = session.user_id, "session expired");
            self.destroy_session()?;
            return Err(AuthError::Expired);
        }

        let account = match self.auth.verify_session(&session) {
            Ok(account) => account,
            Err(AuthError::VerificationFailed) => {
                self.destroy_session()?;
                return Err(AuthError::VerificationFailed);
            }
            Err(err) => return Err(err),
        };

        session.renew(now, self.ttl)?;
        self.store.save_session(&session)?;
        *self.cache() = Some(session.clone());
        debug!(user_id = session.user_id, "session renewed");
        Ok((session, account))
    }

    /// Check the current session, re-verify its identity and slide the expiry.
    ///
    /// # Errors
    /// `NoSession`, `Expired` or `VerificationFailed`. The last two destroy
    /// the session before returning.
    #[instrument(skip(self))]
    pub fn validate_session(&self) -> Result<Session, AuthError> {
        self.validate().map(|(session, _)| session)
    }

    /// Renew the current session without re-verifying the identity.
    ///
    /// # Errors
    /// Returns `AuthError::NoSession` when there is no live session.
    pub fn update_activity(&self) -> Result<Session, AuthError> {
        let mut session = self.get_current_session()?.ok_or(AuthError::NoSession)?;
        session.renew(self.clock.now(), self.ttl)?;
        self.store.save_session(&session)?;
        *self.cache() = Some(session.clone());
        Ok(session)
    }

    /// Remove the cached and persisted session. Succeeds when none exists.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if the store cannot be written.
    pub fn destroy_session(&self) -> Result<(), AuthError> {
        self.cache().take();
        self.store.clear_session()?;
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::Internal` if the store cannot be written.
    pub fn logout(&self) -> Result<(), AuthError> {
        let previous = self.cache().clone();
        self.destroy_session()?;
        if let Some(session) = previous {
            info!(user_id = session.user_id, "logged out");
        }
        Ok(())
    }

    /// Reset expiry to `now + ttl + additional_minutes`.
    ///
    /// The new expiry is computed from the base timeout, not from the current
    /// `expires_at`.
    ///
    /// # Errors
    /// Returns `AuthError::NoSession` when there is no live session and
    /// `AuthError::InvalidFormat` when the new expiry is out of range.
    pub fn extend_session(&self, additional_minutes: i64) -> Result<Session, AuthError> {
        let mut session = self.get_current_session()?.ok_or(AuthError::NoSession)?;
        let now = self.clock.now();
        let expires_at = Duration::try_minutes(additional_minutes)
            .and_then(|extra| now.checked_add_signed(self.ttl)?.checked_add_signed(extra))
            .ok_or_else(|| AuthError::InvalidFormat {
                reasons: vec![format!(
                    "cannot extend the session by {additional_minutes} minutes"
                )],
            })?;
        session.last_activity = now;
        session.expires_at = expires_at;
        self.store.save_session(&session)?;
        *self.cache() = Some(session.clone());
        info!(additional_minutes, "session extended");
        Ok(session)
    }

    /// Account behind a validated (and therefore renewed) session.
    ///
    /// # Errors
    /// Same outcomes as `validate_session`.
    pub fn current_account(&self) -> Result<UserAccount, AuthError> {
        self.validate().map(|(_, account)| account)
    }

    /// Validate the session, then require `capability` of its role.
    ///
    /// # Errors
    /// Session outcomes, or `AuthorizationDenied`.
    pub fn authorize(&self, capability: Capability) -> Result<UserAccount, AuthError> {
        let account = self.current_account()?;
        account.authorize(capability)?;
        Ok(account)
    }

    /// # Errors
    /// Returns `AuthError::Internal` if the store cannot be read.
    pub fn time_remaining(&self) -> Result<Option<Duration>, AuthError> {
        let now = self.clock.now();
        Ok(self
            .get_current_session()?
            .map(|session| session.remaining(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialHasher;
    use crate::clock::ManualClock;
    use crate::directory::{MemoryStore, UserDirectory, UserRecord};
    use crate::identity::Identity;
    use crate::permission::Role;
    use crate::validator::DefaultValidator;
    use anyhow::Result;
    use chrono::{DateTime, Utc};

    struct Fixture {
        sessions: SessionManager,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Result<Fixture> {
        let hasher = CredentialHasher::default().with_params(8, 1, 1)?;
        let record = UserRecord::new(
            Identity::new(
                3,
                "stu".to_string(),
                "stu@x.com".to_string(),
                Role::Student,
                "Stu".to_string(),
                Utc::now(),
            ),
            hasher.hash("secret1")?,
        );
        let store = Arc::new(MemoryStore::with_users([record])?);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = AuthConfig::new();
        let auth = AuthenticationEngine::new(
            store.clone(),
            Arc::new(DefaultValidator),
            clock.clone(),
            &config,
        )
        .with_hasher(hasher);
        let sessions = SessionManager::new(Arc::new(auth), store.clone(), &config);
        Ok(Fixture {
            sessions,
            store,
            clock,
        })
    }

    #[test]
    fn login_persists_session() -> Result<()> {
        let f = fixture()?;
        let opened = f.sessions.login("stu@x.com", "secret1", "student")?;
        assert_eq!(opened.session.user_id, 3);
        assert_eq!(opened.session.role, Role::Student);
        assert_eq!(
            opened.session.expires_at,
            opened.session.created_at + Duration::hours(1)
        );
        assert_eq!(f.store.load_session()?, Some(opened.session));
        Ok(())
    }

    #[test]
    fn validate_renews_expiry() -> Result<()> {
        let f = fixture()?;
        let created = f.sessions.login("stu@x.com", "secret1", "student")?.session;
        f.clock.advance(Duration::minutes(30));
        let renewed = f.sessions.validate_session()?;
        assert_eq!(renewed.session_id, created.session_id);
        assert_eq!(renewed.last_activity, created.created_at + Duration::minutes(30));
        assert_eq!(renewed.expires_at, renewed.last_activity + Duration::hours(1));
        Ok(())
    }

    #[test]
    fn expired_session_is_destroyed_on_validate() -> Result<()> {
        let f = fixture()?;
        f.sessions.login("stu@x.com", "secret1", "student")?;
        f.clock.advance(Duration::hours(1));
        assert!(f.sessions.get_current_session()?.is_none());
        assert!(f.store.load_session()?.is_some());

        assert_eq!(f.sessions.validate_session().err(), Some(AuthError::Expired));
        assert!(f.store.load_session()?.is_none());
        assert_eq!(
            f.sessions.validate_session().err(),
            Some(AuthError::NoSession)
        );
        Ok(())
    }

    #[test]
    fn deleted_user_fails_verification() -> Result<()> {
        let f = fixture()?;
        f.sessions.login("stu@x.com", "secret1", "student")?;
        f.store.delete(3)?;
        assert_eq!(
            f.sessions.validate_session().err(),
            Some(AuthError::VerificationFailed)
        );
        assert!(f.sessions.get_current_session()?.is_none());
        Ok(())
    }

    #[test]
    fn persisted_mirror_is_picked_up() -> Result<()> {
        let f = fixture()?;
        let account = f.sessions.auth().account(3)?;
        let session = f.sessions.create_session(&account)?;

        let config = AuthConfig::new();
        let auth = AuthenticationEngine::new(
            f.store.clone(),
            Arc::new(DefaultValidator),
            f.clock.clone(),
            &config,
        );
        let restarted = SessionManager::new(Arc::new(auth), f.store.clone(), &config);
        assert_eq!(restarted.get_current_session()?, Some(session));
        Ok(())
    }

    #[test]
    fn destroy_is_idempotent() -> Result<()> {
        let f = fixture()?;
        f.sessions.destroy_session()?;
        f.sessions.login("stu@x.com", "secret1", "student")?;
        f.sessions.logout()?;
        f.sessions.destroy_session()?;
        assert!(f.sessions.get_current_session()?.is_none());
        Ok(())
    }

    #[test]
    fn extend_recomputes_from_base_timeout() -> Result<()> {
        let f = fixture()?;
        f.sessions.login("stu@x.com", "secret1", "student")?;
        f.clock.advance(Duration::minutes(40));
        let extended = f.sessions.extend_session(30)?;
        let now = f.clock.now();
        assert_eq!(extended.expires_at, now + Duration::minutes(90));
        assert_eq!(
            f.sessions.time_remaining()?,
            Some(Duration::minutes(90))
        );
        Ok(())
    }

    #[test]
    fn extend_without_session_fails() -> Result<()> {
        let f = fixture()?;
        assert_eq!(
            f.sessions.extend_session(10).err(),
            Some(AuthError::NoSession)
        );
        assert_eq!(
            f.sessions.update_activity().err(),
            Some(AuthError::NoSession)
        );
        Ok(())
    }

    #[test]
    fn extend_rejects_out_of_range_minutes() -> Result<()> {
        let f = fixture()?;
        let created = f.sessions.login("stu@x.com", "secret1", "student")?.session;
        for minutes in [i64::MAX, i64::MIN, i64::MAX / 60_000 + 1] {
            assert!(matches!(
                f.sessions.extend_session(minutes),
                Err(AuthError::InvalidFormat { .. })
            ));
        }
        assert_eq!(f.sessions.get_current_session()?, Some(created.clone()));
        assert_eq!(f.store.load_session()?, Some(created));
        Ok(())
    }

    #[test]
    fn expiry_past_the_calendar_end_is_an_internal_error() -> Result<()> {
        let f = fixture()?;
        let account = f.sessions.auth().account(3)?;
        f.clock.set(DateTime::<Utc>::MAX_UTC - Duration::minutes(30));
        assert!(matches!(
            f.sessions.create_session(&account),
            Err(AuthError::Internal(_))
        ));
        assert!(f.store.load_session()?.is_none());
        Ok(())
    }

    #[test]
    fn update_activity_renews_without_reverifying() -> Result<()> {
        let f = fixture()?;
        let created = f.sessions.login("stu@x.com", "secret1", "student")?.session;
        f.clock.advance(Duration::minutes(20));
        f.store.delete(3)?;

        let renewed = f.sessions.update_activity()?;
        let now = f.clock.now();
        assert_eq!(renewed.session_id, created.session_id);
        assert_eq!(renewed.created_at, created.created_at);
        assert_eq!(renewed.last_activity, now);
        assert_eq!(renewed.expires_at, now + Duration::hours(1));
        assert_eq!(f.store.load_session()?, Some(renewed));

        assert_eq!(
            f.sessions.validate_session().err(),
            Some(AuthError::VerificationFailed)
        );
        Ok(())
    }

    #[test]
    fn authorize_checks_session_role() -> Result<()> {
        let f = fixture()?;
        f.sessions.login("stu@x.com", "secret1", "student")?;
        assert!(f.sessions.authorize(Capability::ViewGrades).is_ok());
        assert!(matches!(
            f.sessions.authorize(Capability::SubmitGrades),
            Err(AuthError::AuthorizationDenied { .. })
        ));
        Ok(())
    }
}

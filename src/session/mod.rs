//! Session lifecycle.
//!
//! Flow Overview:
//! 1) `create_session` mints an id, caches the session and persists a mirror.
//! 2) `validate_session` re-verifies the identity and slides the expiry.
//! 3) Expired or unverifiable sessions are destroyed on detection.
//!
//! States are ABSENT, ACTIVE, EXPIRED and DESTROYED. DESTROYED and ABSENT are
//! indistinguishable to callers; EXPIRED is detected lazily on access.

mod manager;
mod token;

pub use manager::{SessionLogin, SessionManager};
pub use token::generate_session_id;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::identity::UserId;
use crate::permission::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session whose expiry is at or before `now` is logically absent.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at.signed_duration_since(now);
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    fn renew(&mut self, now: DateTime<Utc>, ttl: Duration) -> Result<(), AuthError> {
        self.expires_at = expiry_after(now, ttl)?;
        self.last_activity = now;
        Ok(())
    }
}

/// `now + ttl`, or `Internal` when the result leaves the representable range.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::Internal("session expiry out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>) -> Session {
        Session {
            session_id: "id".to_string(),
            user_id: 1,
            role: Role::Student,
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::hours(1),
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let session = session(now);
        assert!(!session.is_expired(now + Duration::minutes(59)));
        assert!(session.is_expired(now + Duration::hours(1)));
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let now = Utc::now();
        let session = session(now);
        assert_eq!(session.remaining(now), Duration::hours(1));
        assert_eq!(session.remaining(now + Duration::hours(2)), Duration::zero());
    }

    #[test]
    fn renew_keeps_expiry_one_ttl_after_activity() -> Result<(), AuthError> {
        let now = Utc::now();
        let mut session = session(now);
        let later = now + Duration::minutes(20);
        session.renew(later, Duration::hours(1))?;
        assert_eq!(session.last_activity, later);
        assert_eq!(session.expires_at, later + Duration::hours(1));
        assert_eq!(session.created_at, now);
        Ok(())
    }

    #[test]
    fn renew_past_the_calendar_end_leaves_session_untouched() {
        let now = Utc::now();
        let mut session = session(now);
        let before = session.clone();
        let result = session.renew(DateTime::<Utc>::MAX_UTC, Duration::hours(1));
        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert_eq!(session, before);
    }
}

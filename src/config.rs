//! Tunables for lockout and session lifetimes.

use chrono::Duration;
use secrecy::SecretString;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_WINDOW_SECONDS: i64 = 15 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 60 * 60;

/// Upper bound for the lockout window: one day.
pub const MAX_LOCKOUT_WINDOW_SECONDS: i64 = 24 * 60 * 60;
/// Upper bound for the session lifetime: thirty days.
pub const MAX_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    max_attempts: u32,
    lockout_window_seconds: i64,
    session_ttl_seconds: i64,
    password_pepper: Option<SecretString>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_window_seconds: DEFAULT_LOCKOUT_WINDOW_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            password_pepper: None,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Values are clamped to `1..=MAX_LOCKOUT_WINDOW_SECONDS`.
    #[must_use]
    pub fn with_lockout_window_seconds(mut self, seconds: i64) -> Self {
        self.lockout_window_seconds = seconds.clamp(1, MAX_LOCKOUT_WINDOW_SECONDS);
        self
    }

    /// Values are clamped to `1..=MAX_SESSION_TTL_SECONDS`.
    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds.clamp(1, MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_password_pepper(mut self, pepper: Option<SecretString>) -> Self {
        self.password_pepper = pepper;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout_window(&self) -> Duration {
        Duration::seconds(self.lockout_window_seconds)
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    pub(crate) fn password_pepper(&self) -> Option<&SecretString> {
        self.password_pepper.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let config = AuthConfig::new();
        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.lockout_window(), Duration::minutes(15));
        assert_eq!(config.session_ttl(), Duration::hours(1));
        assert!(config.password_pepper().is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = AuthConfig::new()
            .with_max_attempts(3)
            .with_lockout_window_seconds(60)
            .with_session_ttl_seconds(120)
            .with_password_pepper(Some(SecretString::from("pepper".to_string())));
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.lockout_window(), Duration::seconds(60));
        assert_eq!(config.session_ttl(), Duration::seconds(120));
        assert!(config.password_pepper().is_some());
    }

    #[test]
    fn durations_are_clamped_to_bounds() {
        let config = AuthConfig::new()
            .with_lockout_window_seconds(i64::MAX)
            .with_session_ttl_seconds(i64::MAX);
        assert_eq!(config.lockout_window(), Duration::days(1));
        assert_eq!(config.session_ttl(), Duration::days(30));

        let config = AuthConfig::new()
            .with_lockout_window_seconds(-5)
            .with_session_ttl_seconds(0);
        assert_eq!(config.lockout_window(), Duration::seconds(1));
        assert_eq!(config.session_ttl(), Duration::seconds(1));
    }
}

//! Per-email failed login bookkeeping.
//!
//! Flow Overview:
//! 1) Before any store access, `check` refuses emails with `max_attempts`
//!    failures inside the window and drops records whose window has elapsed.
//! 2) Each failed credential check calls `record_failure`, which also sweeps
//!    every record whose window has elapsed.
//! 3) A successful login calls `clear`.
//!
//! The table lives for the lifetime of the process and is never persisted.
//! Updates are read-modify-write; concurrent failures for one email may be
//! under-counted.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub count: u32,
    pub last_attempt: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct LoginAttempts {
    records: Mutex<HashMap<String, LoginAttemptRecord>>,
    max_attempts: u32,
    window: Duration,
}

impl LoginAttempts {
    pub(crate) fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            max_attempts,
            window,
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, LoginAttemptRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, record: &LoginAttemptRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.last_attempt) >= self.window
    }

    /// # Errors
    /// Returns `AuthError::Locked` with the minutes left in the window.
    pub(crate) fn check(&self, email: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let mut records = self.records();
        let Some(record) = records.get(email).copied() else {
            return Ok(());
        };

        if self.is_stale(&record, now) {
            records.remove(email);
            return Ok(());
        }

        if record.count >= self.max_attempts {
            let elapsed = now.signed_duration_since(record.last_attempt);
            let remaining_ms = (self.window - elapsed).num_milliseconds();
            let minutes_remaining = (remaining_ms + 59_999) / 60_000;
            return Err(AuthError::Locked { minutes_remaining });
        }

        Ok(())
    }

    pub(crate) fn record_failure(&self, email: &str, now: DateTime<Utc>) -> LoginAttemptRecord {
        let mut records = self.records();
        records.retain(|_, record| !self.is_stale(record, now));
        let count = records
            .get(email)
            .map_or(1, |record| record.count.saturating_add(1));
        let record = LoginAttemptRecord {
            count,
            last_attempt: now,
        };
        records.insert(email.to_string(), record);
        record
    }

    pub(crate) fn clear(&self, email: &str) {
        self.records().remove(email);
    }

    /// Current record for `email`, treating an elapsed window as absent.
    pub(crate) fn get(&self, email: &str, now: DateTime<Utc>) -> Option<LoginAttemptRecord> {
        self.records()
            .get(email)
            .copied()
            .filter(|record| !self.is_stale(record, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempts() -> LoginAttempts {
        LoginAttempts::new(5, Duration::minutes(15))
    }

    #[test]
    fn locks_after_max_failures() {
        let table = attempts();
        let now = Utc::now();
        for _ in 0..4 {
            table.record_failure("a@x.com", now);
        }
        assert!(table.check("a@x.com", now).is_ok());
        table.record_failure("a@x.com", now);
        assert_eq!(
            table.check("a@x.com", now),
            Err(AuthError::Locked {
                minutes_remaining: 15
            })
        );
    }

    #[test]
    fn minutes_remaining_rounds_up() {
        let table = attempts();
        let start = Utc::now();
        for _ in 0..5 {
            table.record_failure("a@x.com", start);
        }
        let later = start + Duration::minutes(10) + Duration::seconds(1);
        assert_eq!(
            table.check("a@x.com", later),
            Err(AuthError::Locked {
                minutes_remaining: 5
            })
        );
        let almost = start + Duration::minutes(14) + Duration::seconds(59);
        assert_eq!(
            table.check("a@x.com", almost),
            Err(AuthError::Locked {
                minutes_remaining: 1
            })
        );
    }

    #[test]
    fn elapsed_window_discards_record() {
        let table = attempts();
        let start = Utc::now();
        for _ in 0..5 {
            table.record_failure("a@x.com", start);
        }
        let after = start + Duration::minutes(15);
        assert!(table.check("a@x.com", after).is_ok());
        assert!(table.get("a@x.com", after).is_none());
        assert_eq!(table.record_failure("a@x.com", after).count, 1);
    }

    #[test]
    fn clear_resets_counter() {
        let table = attempts();
        let now = Utc::now();
        table.record_failure("a@x.com", now);
        assert_eq!(table.get("a@x.com", now).map(|r| r.count), Some(1));
        table.clear("a@x.com");
        assert!(table.get("a@x.com", now).is_none());
    }

    #[test]
    fn emails_are_tracked_independently() {
        let table = attempts();
        let now = Utc::now();
        for _ in 0..5 {
            table.record_failure("a@x.com", now);
        }
        assert!(table.check("b@x.com", now).is_ok());
    }

    #[test]
    fn failures_sweep_elapsed_records() {
        let table = attempts();
        let start = Utc::now();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            table.record_failure(email, start);
        }
        table.record_failure("c@x.com", start + Duration::minutes(10));
        assert_eq!(table.records().len(), 3);

        let later = start + Duration::minutes(16);
        table.record_failure("d@x.com", later);
        let mut remaining: Vec<String> = table.records().keys().cloned().collect();
        remaining.sort();
        assert_eq!(remaining, vec!["c@x.com".to_string(), "d@x.com".to_string()]);
        assert_eq!(table.get("c@x.com", later).map(|r| r.count), Some(2));
    }
}

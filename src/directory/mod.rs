//! Persistent user records and the session slot.
//!
//! The core treats storage as two narrow traits. `UserDirectory` is a keyed
//! collection of user records; `SessionStore` is a single-record namespace for
//! the persisted session mirror. Both backends in this module keep the two
//! namespaces in one document so a single file holds the whole state.
//!
//! Concurrency: every operation is a read-modify-write of the document with no
//! compare-and-swap, so concurrent writers across processes are
//! last-writer-wins.

mod document;
mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::identity::{Identity, IdentityError, ProfileDetails, RoleProfile, UserAccount, UserId};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("duplicate user")]
    DuplicateUser,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Invalid(#[from] IdentityError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Stored form of a user: identity, opaque credential and role profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub identity: Identity,
    /// Argon2id PHC string; never the raw password.
    pub password_hash: String,
    pub profile: RoleProfile,
}

impl UserRecord {
    /// Build a record whose profile is the empty variant for the identity's role.
    #[must_use]
    pub fn new(identity: Identity, password_hash: String) -> Self {
        let profile = RoleProfile::empty(identity.role());
        Self {
            identity,
            password_hash,
            profile,
        }
    }

    /// Apply a partial update. Id, role and email are not patchable.
    ///
    /// # Errors
    /// Returns `IdentityError::ProfileMismatch` if the patch carries a profile
    /// for another role; the record is left untouched in that case.
    pub fn apply(&mut self, patch: UserPatch) -> Result<(), IdentityError> {
        if let Some(profile) = &patch.profile {
            if profile.role() != self.identity.role() {
                return Err(IdentityError::ProfileMismatch {
                    role: self.identity.role(),
                    profile: profile.role(),
                });
            }
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(details) = patch.details {
            self.identity.details = details;
        }
        if let Some(profile) = patch.profile {
            self.profile = profile;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub password_hash: Option<String>,
    pub details: Option<ProfileDetails>,
    pub profile: Option<RoleProfile>,
}

impl UserPatch {
    #[must_use]
    pub fn password_hash(hash: String) -> Self {
        Self {
            password_hash: Some(hash),
            ..Self::default()
        }
    }

    /// Persist everything mutable about `account`.
    #[must_use]
    pub fn from_account(account: &UserAccount) -> Self {
        Self {
            password_hash: None,
            details: Some(account.identity().details.clone()),
            profile: Some(account.profile().clone()),
        }
    }
}

pub trait UserDirectory: Send + Sync {
    /// # Errors
    /// Returns `DirectoryError::Storage` if the backing store cannot be read.
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    /// # Errors
    /// Returns `DirectoryError::Storage` if the backing store cannot be read.
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError>;

    /// Insert a record. An id of `0` asks the store to allocate one.
    ///
    /// # Errors
    /// Returns `DirectoryError::DuplicateUser` when the id, email or username is taken.
    fn add(&self, record: UserRecord) -> Result<UserId, DirectoryError>;

    /// # Errors
    /// Returns `DirectoryError::UserNotFound` when no record has this id.
    fn update(&self, id: UserId, patch: UserPatch) -> Result<(), DirectoryError>;

    /// # Errors
    /// Returns `DirectoryError::UserNotFound` when no record has this id.
    fn delete(&self, id: UserId) -> Result<(), DirectoryError>;

    /// # Errors
    /// Returns `DirectoryError::Storage` if the backing store cannot be read.
    fn list(&self) -> Result<Vec<UserRecord>, DirectoryError>;
}

pub trait SessionStore: Send + Sync {
    /// # Errors
    /// Returns `StoreError` if the backing store cannot be read.
    fn load_session(&self) -> Result<Option<Session>, StoreError>;

    /// Overwrite the persisted session.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing store cannot be written.
    fn save_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove the persisted session; succeeds when none exists.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing store cannot be written.
    fn clear_session(&self) -> Result<(), StoreError>;
}

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Role;
    use chrono::Utc;

    fn record(role: Role) -> UserRecord {
        UserRecord::new(
            Identity::new(
                1,
                "ada".to_string(),
                "ada@school.test".to_string(),
                role,
                "Ada".to_string(),
                Utc::now(),
            ),
            "hash".to_string(),
        )
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn apply_updates_mutable_fields() {
        let mut record = record(Role::Student);
        let details = ProfileDetails {
            phone: Some("555-0100".to_string()),
            ..ProfileDetails::default()
        };
        let patch = UserPatch {
            password_hash: Some("new".to_string()),
            details: Some(details.clone()),
            profile: None,
        };
        assert!(record.apply(patch).is_ok());
        assert_eq!(record.password_hash, "new");
        assert_eq!(record.identity.details, details);
        assert_eq!(record.identity.email(), "ada@school.test");
    }

    #[test]
    fn apply_rejects_foreign_profile() {
        let mut record = record(Role::Student);
        let patch = UserPatch {
            password_hash: Some("new".to_string()),
            details: None,
            profile: Some(RoleProfile::empty(Role::Teacher)),
        };
        assert!(record.apply(patch).is_err());
        assert_eq!(record.password_hash, "hash");
    }

    #[test]
    fn record_json_flattens_identity() -> anyhow::Result<()> {
        let value = serde_json::to_value(record(Role::Teacher))?;
        assert_eq!(value["email"], serde_json::json!("ada@school.test"));
        assert_eq!(value["role"], serde_json::json!("teacher"));
        assert_eq!(value["profile"]["kind"], serde_json::json!("teacher"));
        let decoded: UserRecord = serde_json::from_value(value)?;
        assert_eq!(decoded.identity.username(), "ada");
        Ok(())
    }
}

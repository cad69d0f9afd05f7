//! Process-local store, used by tests and embedders that bring their own persistence.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::document::StoreDocument;
use super::{DirectoryError, SessionStore, StoreError, UserDirectory, UserPatch, UserRecord};
use crate::identity::UserId;
use crate::session::Session;

#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<StoreDocument>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records.
    ///
    /// # Errors
    /// Returns `DirectoryError::DuplicateUser` if two records clash.
    pub fn with_users(records: impl IntoIterator<Item = UserRecord>) -> Result<Self, DirectoryError> {
        let store = Self::new();
        for record in records {
            store.add(record)?;
        }
        Ok(store)
    }

    fn document(&self) -> MutexGuard<'_, StoreDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserDirectory for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.document().find_by_email(email).cloned())
    }

    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.document().find_by_id(id).cloned())
    }

    fn add(&self, record: UserRecord) -> Result<UserId, DirectoryError> {
        self.document().add(record)
    }

    fn update(&self, id: UserId, patch: UserPatch) -> Result<(), DirectoryError> {
        self.document().update(id, patch)
    }

    fn delete(&self, id: UserId) -> Result<(), DirectoryError> {
        self.document().delete(id)
    }

    fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.document().users().to_vec())
    }
}

impl SessionStore for MemoryStore {
    fn load_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.document().session.clone())
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.document().session = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        self.document().session = None;
        Ok(())
    }
}

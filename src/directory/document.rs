//! In-memory document shared by both store backends.

use serde::{Deserialize, Serialize};

use super::{normalize_email, DirectoryError, UserPatch, UserRecord};
use crate::identity::UserId;
use crate::session::Session;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct StoreDocument {
    #[serde(default)]
    next_id: UserId,
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) session: Option<Session>,
}

impl StoreDocument {
    pub(super) fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        let email = normalize_email(email);
        self.users
            .iter()
            .find(|record| normalize_email(record.identity.email()) == email)
    }

    pub(super) fn find_by_id(&self, id: UserId) -> Option<&UserRecord> {
        self.users.iter().find(|record| record.identity.id() == id)
    }

    pub(super) fn add(&mut self, mut record: UserRecord) -> Result<UserId, DirectoryError> {
        let email = normalize_email(record.identity.email());
        let username = record.identity.username().to_lowercase();
        let requested = record.identity.id();

        let clash = self.users.iter().any(|existing| {
            normalize_email(existing.identity.email()) == email
                || existing.identity.username().to_lowercase() == username
                || (requested != 0 && existing.identity.id() == requested)
        });
        if clash {
            return Err(DirectoryError::DuplicateUser);
        }

        let highest = self
            .users
            .iter()
            .map(|existing| existing.identity.id())
            .max()
            .unwrap_or(0);
        let id = if requested == 0 {
            self.next_id.max(highest) + 1
        } else {
            requested
        };
        self.next_id = self.next_id.max(id);

        record.identity.assign_id(id);
        self.users.push(record);
        Ok(id)
    }

    pub(super) fn update(&mut self, id: UserId, patch: UserPatch) -> Result<(), DirectoryError> {
        let record = self
            .users
            .iter_mut()
            .find(|record| record.identity.id() == id)
            .ok_or(DirectoryError::UserNotFound)?;
        record.apply(patch)?;
        Ok(())
    }

    pub(super) fn delete(&mut self, id: UserId) -> Result<(), DirectoryError> {
        let before = self.users.len();
        self.users.retain(|record| record.identity.id() != id);
        if self.users.len() == before {
            return Err(DirectoryError::UserNotFound);
        }
        Ok(())
    }

    pub(super) fn users(&self) -> &[UserRecord] {
        &self.users
    }
}

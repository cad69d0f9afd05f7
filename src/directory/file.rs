//! JSON document store on the local filesystem.
//!
//! Every call re-reads the file so separate processes sharing the path observe
//! each other's writes. Writes go to a sibling temp file first and are renamed
//! into place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

use super::document::StoreDocument;
use super::{DirectoryError, SessionStore, StoreError, UserDirectory, UserPatch, UserRecord};
use crate::identity::UserId;
use crate::session::Session;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreDocument, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("store {} does not exist yet", self.path.display());
                Ok(StoreDocument::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn view<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> Result<T, StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let document = self.read()?;
        Ok(f(&document))
    }

    fn modify<T, E>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read()?;
        let value = f(&mut document)?;
        self.write(&document)?;
        Ok(value)
    }
}

impl UserDirectory for JsonFileStore {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.view(|doc| doc.find_by_email(email).cloned())?)
    }

    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.view(|doc| doc.find_by_id(id).cloned())?)
    }

    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    fn add(&self, record: UserRecord) -> Result<UserId, DirectoryError> {
        self.modify(|doc| doc.add(record))
    }

    #[instrument(skip(self, patch), fields(path = %self.path.display()))]
    fn update(&self, id: UserId, patch: UserPatch) -> Result<(), DirectoryError> {
        self.modify(|doc| doc.update(id, patch))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn delete(&self, id: UserId) -> Result<(), DirectoryError> {
        self.modify(|doc| doc.delete(id))
    }

    fn list(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.view(|doc| doc.users().to_vec())?)
    }
}

impl SessionStore for JsonFileStore {
    fn load_session(&self) -> Result<Option<Session>, StoreError> {
        self.view(|doc| doc.session.clone())
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.modify(|doc| {
            doc.session = Some(session.clone());
            Ok::<(), StoreError>(())
        })
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        self.modify(|doc| {
            doc.session = None;
            Ok::<(), StoreError>(())
        })
    }
}

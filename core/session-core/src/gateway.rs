//! Collaborator contracts consumed by the core, plus the user stores that
//! ship with it.
//!
//! # Defensive Loading
//!
//! `JsonFileUserStore::load` never fails: a missing, empty or corrupt file
//! is treated as "no cached user" (logged), because the cached profile is a
//! convenience and the server remains authoritative.
//!
//! # Atomic Writes
//!
//! Saves go through a temp file in the target directory followed by a
//! rename, so a crash never leaves a half-written profile behind.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Result, SessionError};
use crate::types::User;

/// Remote authentication API.
pub trait AuthGateway {
    fn is_authenticated(&self) -> bool;

    /// Expiry of the persisted token in epoch milliseconds.
    fn token_expiry_ms(&self) -> Option<i64>;

    /// Exchanges the current token for a fresh one; returns the new expiry.
    fn refresh_token(&self) -> Result<i64>;

    fn logout(&self) -> Result<()>;
}

/// Key-value persistence for the cached user profile.
pub trait PersistedUserStore {
    fn load(&self) -> Option<User>;
    fn save(&self, user: &User) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    user: RefCell<Option<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        MemoryUserStore {
            user: RefCell::new(Some(user)),
        }
    }
}

impl PersistedUserStore for MemoryUserStore {
    fn load(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn save(&self, user: &User) -> Result<()> {
        *self.user.borrow_mut() = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.user.borrow_mut().take();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileUserStore {
    path: PathBuf,
}

impl JsonFileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileUserStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistedUserStore for JsonFileUserStore {
    fn load(&self) -> Option<User> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(error = %err, "Failed to read cached user");
                return None;
            }
        };

        if content.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&content) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "Discarding corrupt cached user");
                None
            }
        }
    }

    fn save(&self, user: &User) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| SessionError::Io {
            context: format!("creating {}", parent.display()),
            source,
        })?;

        let content = serde_json::to_string_pretty(user).map_err(|source| SessionError::Json {
            context: "serializing user".to_string(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| SessionError::Io {
            context: "creating temp file".to_string(),
            source,
        })?;
        tmp.write_all(content.as_bytes())
            .map_err(|source| SessionError::Io {
                context: "writing user".to_string(),
                source,
            })?;
        tmp.persist(&self.path).map_err(|err| SessionError::Io {
            context: format!("persisting {}", self.path.display()),
            source: err.error,
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                context: format!("removing {}", self.path.display()),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;

    fn user() -> User {
        User {
            id: "u-7".to_string(),
            email: "owner@example.com".to_string(),
            display_name: Some("Owner".to_string()),
            role: UserRole::ServiceAdmin,
        }
    }

    #[test]
    fn memory_store_save_load_clear() {
        let store = MemoryUserStore::new();
        assert_eq!(store.load(), None);
        store.save(&user()).expect("save");
        assert_eq!(store.load(), Some(user()));
        store.clear().expect("clear");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn file_store_persists_user() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileUserStore::new(temp_dir.path().join("nested").join("user.json"));
        store.save(&user()).expect("save");

        let reopened = JsonFileUserStore::new(store.path().to_path_buf());
        assert_eq!(reopened.load(), Some(user()));
    }

    #[test]
    fn file_store_treats_corrupt_file_as_empty() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("user.json");
        std::fs::write(&path, "{not json").expect("write");
        assert_eq!(JsonFileUserStore::new(&path).load(), None);

        std::fs::write(&path, "   ").expect("write");
        assert_eq!(JsonFileUserStore::new(&path).load(), None);
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileUserStore::new(temp_dir.path().join("user.json"));
        store.clear().expect("clear missing");
        store.save(&user()).expect("save");
        store.clear().expect("clear");
        store.clear().expect("clear again");
        assert_eq!(store.load(), None);
    }
}

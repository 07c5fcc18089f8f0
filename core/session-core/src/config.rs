//! Client configuration loading and saving.
//!
//! Handles paths and persistence for:
//! - Session timing (warning lead time, expiry grace delay)
//! - Location of the cached user profile

use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::clock::DEFAULT_WARNING_LEAD_MS;
use crate::error::{Result, SessionError};
use crate::presenter::DEFAULT_EXPIRY_GRACE_MS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long before expiry the warning fires.
    pub warning_lead_ms: u64,
    /// How long the "session expired" message stays before logout completes.
    pub expiry_grace_ms: u64,
    pub user_store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            warning_lead_ms: DEFAULT_WARNING_LEAD_MS,
            expiry_grace_ms: DEFAULT_EXPIRY_GRACE_MS,
            user_store_path: None,
        }
    }
}

impl ClientConfig {
    /// Configured user store path, or `~/.ahp-client/user.json`.
    pub fn resolved_user_store_path(&self) -> Result<PathBuf> {
        match &self.user_store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(client_dir()?.join("user.json")),
        }
    }
}

/// Returns the client data directory (~/.ahp-client).
pub fn client_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ahp-client"))
        .ok_or(SessionError::HomeDirNotFound)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(client_dir()?.join("config.json"))
}

/// Loads the configuration, returning defaults if the file is missing or empty.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ClientConfig::default())
        }
        Err(source) => {
            return Err(SessionError::Io {
                context: format!("reading {}", path.display()),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(ClientConfig::default());
    }

    serde_json::from_str(&content).map_err(|err| SessionError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SessionError::Io {
            context: format!("creating {}", parent.display()),
            source,
        })?;
    }
    let content = serde_json::to_string_pretty(config).map_err(|source| SessionError::Json {
        context: "serializing config".to_string(),
        source,
    })?;
    fs::write(path, content).map_err(|source| SessionError::Io {
        context: format!("writing {}", path.display()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&temp_dir.path().join("config.json")).expect("load");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.warning_lead_ms, 300_000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"warning_lead_ms": 60000}"#).expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.warning_lead_ms, 60_000);
        assert_eq!(config.expiry_grace_ms, DEFAULT_EXPIRY_GRACE_MS);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ nope").expect("write");

        assert!(matches!(
            load_config(&path),
            Err(SessionError::ConfigMalformed { .. })
        ));
    }

    #[test]
    fn save_then_load() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            warning_lead_ms: 1_000,
            expiry_grace_ms: 10,
            user_store_path: Some(temp_dir.path().join("user.json")),
        };
        save_config(&path, &config).expect("save");
        assert_eq!(load_config(&path).expect("load"), config);
        assert_eq!(
            config.resolved_user_store_path().expect("path"),
            temp_dir.path().join("user.json")
        );
    }
}

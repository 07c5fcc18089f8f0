//! Error types for session-core operations.
//!
//! Most failure paths in this crate are recoverable and logged rather than
//! returned (stale timers, unknown tabs, corrupt history payloads). The
//! variants here cover what a caller can act on.

use std::path::PathBuf;

/// All errors that can occur in session-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    // ─────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    #[error("Logout request failed: {reason}")]
    LogoutFailed { reason: String },

    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Home directory not found")]
    HomeDirNotFound,

    // ─────────────────────────────────────────────────────────────────────
    // Navigation Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Unknown tab: {0}")]
    UnknownTab(String),
}

/// Convenience type alias for Results using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<SessionError> for String {
    fn from(err: SessionError) -> String {
        err.to_string()
    }
}

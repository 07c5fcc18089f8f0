//! Shared session types.

use serde::{Deserialize, Serialize};

/// Monotonic counter bumped on every `start`/`extend`. Timers carry the
/// generation they were scheduled under; a mismatch marks them stale.
pub type Generation = u64;

/// Lifecycle of the current auth token.
///
/// ```text
/// Anonymous --login--> Authenticated --warning--> Expiring --expiry--> Expired
///     ^                  |    ^                      |                   |
///     |                  |    +------- extend -------+                   |
///     +---- logout ------+                                               |
///     +----------------------- logout side effect completes -------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticated,
    Expiring,
    Expired,
}

impl SessionStatus {
    /// True while the token is still valid, including the warning window.
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionStatus::Authenticated | SessionStatus::Expiring)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Expiring => "expiring",
            SessionStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the session owned by [`crate::TokenClock`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub token_expiry_epoch_ms: Option<i64>,
    pub generation: Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    ServiceAdmin,
    ServiceUser,
    Evaluator,
}

/// Cached profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: UserRole,
}

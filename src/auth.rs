//! Boundary to the auth collaborator.
//!
//! The client consumes this read-only: a bearer token for every request, the
//! current user to gate admin-only actions, and a login timestamp to decide
//! whether the UI may run at all. Token issuance and role checks live on the
//! other side of this seam.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Sessions expire two hours after login.
pub const SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);

// ============================================================================
// Role / CurrentUser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(deserialize_with = "crate::types::de::lenient_i64")]
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ============================================================================
// AuthProvider
// ============================================================================

/// Read-only view of the persisted auth state.
///
/// `None` from either method means the session is missing or invalid; the
/// transport sends no Authorization header and admin gating fails closed.
pub trait AuthProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
    fn current_user(&self) -> Option<CurrentUser>;

    fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|u| u.is_admin())
    }
}

// ============================================================================
// SessionInfo
// ============================================================================

/// The persisted session triple: token, user, login timestamp (epoch millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub token: String,
    pub user: CurrentUser,
    #[serde(rename = "loginTime", deserialize_with = "crate::types::de::lenient_i64")]
    pub login_time_ms: i64,
}

impl SessionInfo {
    /// Whether the session has outlived [`SESSION_TTL`].
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }

    fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.login_time_ms) > SESSION_TTL.as_millis() as i64
    }
}

impl AuthProvider for SessionInfo {
    fn bearer_token(&self) -> Option<String> {
        if self.is_expired() {
            None
        } else {
            Some(self.token.clone())
        }
    }

    fn current_user(&self) -> Option<CurrentUser> {
        if self.is_expired() {
            None
        } else {
            Some(self.user.clone())
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

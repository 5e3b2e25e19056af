/// Account management system
///
/// Handles account creation, credential authentication, sessions, and the
/// profile-limbo check used to resume signup.

mod manager;

pub use manager::AccountManager;

use crate::db::models::Profile;
use serde::{Deserialize, Serialize};

/// Sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub email: String,
    pub password: String,
}

/// Session response (tokens plus the profile-limbo flag)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub account_id: String,
    pub email: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
    /// False while the account is still in signup limbo
    pub has_profile: bool,
}

/// Session info (for getSession / resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub account_id: String,
    pub email: String,
    pub has_profile: bool,
    pub profile: Option<Profile>,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSessionRequest {
    pub refresh_jwt: String,
}

/// Validated session from bearer token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub account_id: String,
    pub session_id: String,
}

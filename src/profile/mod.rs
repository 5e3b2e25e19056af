/// Profile management system
///
/// Profiles carry everything other users can see: username, display name,
/// avatar, bio, and the admin/verified flags. A profile is created only after
/// credentials exist, as the final step of signup.

mod manager;

pub use manager::ProfileManager;

use crate::db::models::Profile;
use serde::{Deserialize, Serialize};

/// Profile with its aggregate counts, as presented on the profile screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub profile: Profile,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Username availability probe result
///
/// Advisory only: the UNIQUE constraint on profile.username is the actual
/// enforcement point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub username: String,
    pub available: bool,
}

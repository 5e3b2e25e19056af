/// Database row models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database
///
/// Credentials only. Everything presented to other users lives on the
/// Profile, which is created later in the signup flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Session record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Refresh token record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: String,
    pub account_id: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

/// Profile record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Post record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub title: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Null until the first edit; refreshed on every subsequent edit.
    pub edited_at: Option<DateTime<Utc>>,
}

/// Tag record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Reaction kind from the fixed catalog
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReactionKind {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub sort_order: i64,
}

/// Reaction membership row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostReaction {
    pub post_id: String,
    pub user_id: String,
    pub reaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// Directed follow edge
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

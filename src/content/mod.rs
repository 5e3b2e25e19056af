/// Content store: posts and their tag associations
mod manager;

pub use manager::PostManager;

use crate::db::models::{Post, Profile};
use serde::{Deserialize, Serialize};

/// Input for creating or editing a post
///
/// Tag names are normalized (trimmed, empties dropped, duplicates removed)
/// before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub image_url: String,
    pub title: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A post joined with its author profile and tag names
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Profile,
    pub tags: Vec<String>,
}

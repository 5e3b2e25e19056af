/// Social graph store: directed follow edges
mod manager;

pub use manager::GraphManager;

use serde::Serialize;

/// Follow counts for a profile, with the viewer's own edge state when known
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    pub follower_count: i64,
    pub following_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_following: Option<bool>,
}

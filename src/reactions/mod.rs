/// Reaction store: fixed emoji catalog, per-post membership rows
mod manager;

pub use manager::ReactionManager;

use crate::db::models::ReactionKind;
use serde::Serialize;

/// Per-kind reaction state for one post, ordered by the catalog sort order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    #[serde(flatten)]
    pub kind: ReactionKind,
    pub count: i64,
    pub viewer_reacted: bool,
}

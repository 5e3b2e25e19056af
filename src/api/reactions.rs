/// Reaction endpoints
use crate::{
    auth::{AuthContext, OptionalAuthContext},
    context::AppContext,
    db::models::ReactionKind,
    error::SnsResult,
    metrics,
    reactions::ReactionSummary,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

/// Build reaction routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/reactions", get(list_reactions))
        .route("/api/posts/:id/reactions", get(post_reactions))
        .route("/api/posts/:id/reactions/:kind", post(toggle_reaction))
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    reactions: Vec<ReactionKind>,
}

/// The fixed reaction catalog in display order
async fn list_reactions(State(ctx): State<AppContext>) -> SnsResult<Json<CatalogResponse>> {
    let reactions = ctx.reaction_manager.list_kinds().await?;

    Ok(Json(CatalogResponse { reactions }))
}

/// Toggle the caller's reaction of the given kind on a post
async fn toggle_reaction(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((post_id, kind)): Path<(String, String)>,
) -> SnsResult<Json<serde_json::Value>> {
    let reacted = ctx
        .reaction_manager
        .toggle_reaction(&post_id, &auth.account_id, &kind)
        .await?;

    metrics::record_reaction_toggle(reacted);

    Ok(Json(serde_json::json!({ "reacted": reacted })))
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    reactions: Vec<ReactionSummary>,
}

/// Per-kind counts for a post, with the viewer's own reactions marked
async fn post_reactions(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(post_id): Path<String>,
) -> SnsResult<Json<SummaryResponse>> {
    let reactions = ctx
        .reaction_manager
        .summarize(&post_id, auth.account_id())
        .await?;

    Ok(Json(SummaryResponse { reactions }))
}

/// Follow graph endpoints
use crate::{
    auth::{AuthContext, OptionalAuthContext},
    context::AppContext,
    error::SnsResult,
    graph::FollowStats,
    metrics,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

/// Build follow routes
pub fn routes() -> Router<AppContext> {
    Router::new().route(
        "/api/follows/:account_id",
        post(toggle_follow).get(follow_stats),
    )
}

/// Toggle a follow edge toward the target account
async fn toggle_follow(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(account_id): Path<String>,
) -> SnsResult<Json<serde_json::Value>> {
    let following = ctx
        .graph_manager
        .toggle_follow(&auth.account_id, &account_id)
        .await?;

    metrics::record_follow_toggle(following);
    tracing::info!(
        follower_id = %auth.account_id,
        target_id = %account_id,
        following,
        "Follow toggled"
    );

    Ok(Json(serde_json::json!({ "following": following })))
}

/// Follower and following counts, plus the viewer's own edge when signed in
async fn follow_stats(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(account_id): Path<String>,
) -> SnsResult<Json<FollowStats>> {
    let stats = ctx
        .graph_manager
        .follow_stats(&account_id, auth.account_id())
        .await?;

    Ok(Json(stats))
}

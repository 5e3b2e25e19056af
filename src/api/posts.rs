/// Post endpoints
use crate::{
    auth::AuthContext,
    content::{PostInput, PostView},
    context::AppContext,
    error::{SnsError, SnsResult},
    metrics,
};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

/// Build post routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/posts", post(create_post))
        .route(
            "/api/posts/:id",
            get(get_post).put(edit_post).delete(delete_post),
        )
        .route("/api/tags/popular", get(popular_tags))
}

/// Create a post
async fn create_post(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(input): Json<PostInput>,
) -> SnsResult<Json<PostView>> {
    let view = ctx.post_manager.create_post(&auth.account_id, input).await?;

    metrics::record_post_created(view.post.region.is_some());
    tracing::info!(post_id = %view.post.id, author_id = %auth.account_id, "Post created");

    Ok(Json(view))
}

/// Get a post with its author and tags
async fn get_post(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> SnsResult<Json<PostView>> {
    let view = ctx
        .post_manager
        .get_post(&id)
        .await?
        .ok_or_else(|| SnsError::NotFound("Post not found".to_string()))?;

    Ok(Json(view))
}

/// Edit a post (author only); the tag set is replaced wholesale
async fn edit_post(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(input): Json<PostInput>,
) -> SnsResult<Json<PostView>> {
    let view = ctx
        .post_manager
        .edit_post(&id, &auth.account_id, input)
        .await?;

    Ok(Json(view))
}

/// Delete a post (author or admin)
async fn delete_post(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> SnsResult<Json<serde_json::Value>> {
    ctx.post_manager.delete_post(&id, &auth.account_id).await?;

    tracing::info!(post_id = %id, requester_id = %auth.account_id, "Post deleted");

    Ok(Json(serde_json::json!({})))
}

/// First twenty tag names in insertion order
async fn popular_tags(State(ctx): State<AppContext>) -> SnsResult<Json<serde_json::Value>> {
    let tags = ctx.post_manager.popular_tags().await?;

    Ok(Json(serde_json::json!({ "tags": tags })))
}

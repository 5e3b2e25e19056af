/// Feed query endpoint
use crate::{
    auth::OptionalAuthContext,
    content::PostView,
    context::AppContext,
    error::{SnsError, SnsResult},
    feed::FeedQuery,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build feed routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/feed", get(query_feed))
}

#[derive(Debug, Deserialize)]
struct FeedParams {
    author: Option<String>,
    #[serde(default)]
    following: bool,
    region: Option<String>,
    search: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct FeedResponse {
    posts: Vec<PostView>,
}

/// Query the feed
///
/// All filters combine with AND. `following=true` needs a signed-in caller;
/// everything else degrades gracefully without one.
async fn query_feed(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Query(params): Query<FeedParams>,
) -> SnsResult<Json<FeedResponse>> {
    let following_only_for = if params.following {
        let account_id = auth.account_id().ok_or_else(|| {
            SnsError::Authentication("Sign in to view the following feed".to_string())
        })?;
        Some(account_id.to_string())
    } else {
        None
    };

    let query = FeedQuery {
        author_id: params.author,
        following_only_for,
        region: params.region,
        search: params.search,
        tag: params.tag,
    };

    let posts = ctx.feed_manager.query_feed(&query).await?;

    Ok(Json(FeedResponse { posts }))
}

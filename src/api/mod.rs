/// API routes and handlers
pub mod blob;
pub mod feed;
pub mod graph;
pub mod health;
pub mod meta;
pub mod middleware;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod session;
pub mod signup;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(session::routes())
        .merge(signup::routes())
        .merge(profiles::routes())
        .merge(posts::routes())
        .merge(feed::routes())
        .merge(graph::routes())
        .merge(reactions::routes())
        .merge(blob::routes())
        .merge(meta::routes())
        .merge(health::routes())
}

/// Static catalog endpoints
use crate::{context::AppContext, validation::REGIONS};
use axum::{routing::get, Json, Router};

/// Build catalog routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/regions", get(list_regions))
}

/// The fixed region catalog, in display order
async fn list_regions() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "regions": REGIONS.as_slice() }))
}

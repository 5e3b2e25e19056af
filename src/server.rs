/// HTTP server setup and routing
use crate::{
    api::middleware::track_metrics,
    context::AppContext,
    error::{SnsError, SnsResult},
    rate_limit::rate_limit_middleware,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = ctx.config.service.blob_upload_limit;

    Router::new()
        .merge(crate::api::routes())
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx.clone())
        // Apply rate limiting middleware (after state so it can access AppContext)
        .layer(middleware::from_fn_with_state(ctx, rate_limit_middleware))
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Raw image uploads are the largest accepted bodies
        .layer(DefaultBodyLimit::max(body_limit))
        .fallback(not_found)
}

/// 404 handler
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NotFound",
            "message": "Endpoint not found"
        })),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> SnsResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("🍬 Okashi Feed listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SnsError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    // Axum 0.7: Router<()> can be passed directly to serve
    axum::serve(listener, app)
        .await
        .map_err(|e| SnsError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

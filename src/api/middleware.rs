/// Authentication and metrics middleware
use crate::{
    account::ValidatedSession,
    context::AppContext,
    error::{SnsError, SnsResult},
    metrics,
};
use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            if s.starts_with("Bearer ") {
                Some(s[7..].to_string())
            } else {
                None
            }
        })
}

/// Require authentication - validate the bearer token or return 401
pub async fn require_auth(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> SnsResult<ValidatedSession> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| SnsError::Authentication("Missing authorization header".to_string()))?;

    ctx.account_manager.validate_access_token(&token).await
}

/// Record request count and latency for every response
///
/// Labels use the matched route pattern rather than the raw path so that
/// per-id URLs do not fan out into unbounded label sets.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    metrics::record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Health check endpoints for liveness and readiness probes
///
/// Supports two types of probes:
/// - Liveness: Is the application alive? (restart if not)
/// - Readiness: Can the application serve traffic? (remove from load balancer if not)

use crate::{context::AppContext, error::SnsResult, jobs, metrics};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// Application version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: f64,

    /// Individual component checks
    pub checks: Vec<ComponentHealth>,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,

    /// Status: "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// Response time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,

    /// Optional error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
        .route("/health/detailed", get(health_detailed))
        .route("/metrics", get(serve_metrics))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
///
/// If we can respond at all, we're alive.
pub async fn liveness_probe() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Readiness probe
///
/// Returns 200 once the database answers queries, 503 otherwise.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = check_database(&ctx).await {
        tracing::warn!(error = %e, "readiness_probe_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Detailed health check with all component statuses
pub async fn health_detailed(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthStatus>) {
    let start = Instant::now();
    let mut checks = Vec::new();

    checks.push(check_database_detailed(&ctx).await);
    checks.push(check_background_jobs_detailed(&ctx).await);

    let overall_status = determine_overall_status(&checks);
    let uptime = metrics::UPTIME_SECONDS.get();

    let health = HealthStatus {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        checks,
        message: if overall_status == "healthy" {
            None
        } else {
            Some("One or more components are unhealthy".to_string())
        },
    };

    let status_code = match overall_status.as_str() {
        "healthy" => StatusCode::OK,
        "degraded" => StatusCode::OK, // Still serving traffic
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    tracing::info!(
        status = %overall_status,
        duration_ms = start.elapsed().as_millis(),
        "health_check_completed"
    );

    (status_code, Json(health))
}

/// Prometheus text-format metrics
pub async fn serve_metrics() -> ([(axum::http::HeaderName, &'static str); 1], String) {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        metrics::render_metrics(),
    )
}

/// Check database connectivity
async fn check_database(ctx: &AppContext) -> SnsResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;
    Ok(())
}

/// Check database with detailed metrics
async fn check_database_detailed(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();

    match check_database(ctx).await {
        Ok(_) => ComponentHealth {
            name: "database".to_string(),
            status: "healthy".to_string(),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => ComponentHealth {
            name: "database".to_string(),
            status: "unhealthy".to_string(),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error: Some(e.to_string()),
        },
    }
}

/// Check background jobs status
async fn check_background_jobs_detailed(ctx: &AppContext) -> ComponentHealth {
    let start = Instant::now();

    match jobs::tasks::health_check(ctx).await {
        Ok(_) => ComponentHealth {
            name: "background_jobs".to_string(),
            status: "healthy".to_string(),
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => ComponentHealth {
            name: "background_jobs".to_string(),
            status: "degraded".to_string(), // Jobs failing is degraded, not critical
            response_time_ms: Some(start.elapsed().as_millis() as u64),
            error: Some(e.to_string()),
        },
    }
}

/// Determine overall health status from individual checks
fn determine_overall_status(checks: &[ComponentHealth]) -> String {
    let unhealthy_count = checks.iter().filter(|c| c.status == "unhealthy").count();
    let degraded_count = checks.iter().filter(|c| c.status == "degraded").count();

    if unhealthy_count > 0 {
        "unhealthy".to_string()
    } else if degraded_count > 0 {
        "degraded".to_string()
    } else {
        "healthy".to_string()
    }
}

/// Blob upload and serving endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    error::{SnsError, SnsResult},
    metrics,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build blob routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/blobs", post(upload_blob))
        .route("/blobs/:cid", get(get_blob))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum UploadKind {
    Avatar,
    Post,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    kind: Option<UploadKind>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    cid: String,
    url: String,
    mime_type: String,
    size: i64,
}

/// Upload an image
///
/// Accepts raw binary data in the request body with a Content-Type header.
/// `kind=avatar` routes through avatar processing (square crop, 400px JPEG);
/// anything else is stored as-is after sniffing.
async fn upload_blob(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> SnsResult<Json<UploadResponse>> {
    let mime_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let data = body.to_vec();

    let stored = match params.kind {
        Some(UploadKind::Avatar) => ctx.blob_store.upload_avatar(data).await?,
        _ => ctx.blob_store.upload(data, mime_type.as_deref()).await?,
    };

    metrics::record_blob_upload(&stored.mime_type);
    tracing::info!(
        cid = %stored.cid,
        account_id = %auth.account_id,
        size = stored.size,
        "Blob uploaded"
    );

    Ok(Json(UploadResponse {
        url: ctx.blob_url(&stored.cid),
        cid: stored.cid,
        mime_type: stored.mime_type,
        size: stored.size,
    }))
}

/// Serve a stored image by CID
///
/// CIDs are content-addressed, so responses are immutable and cacheable
/// forever; If-None-Match short-circuits to 304.
async fn get_blob(
    State(ctx): State<AppContext>,
    Path(cid): Path<String>,
    headers: HeaderMap,
) -> SnsResult<Response> {
    let (data, mime_type) = ctx
        .blob_store
        .get(&cid)
        .await?
        .ok_or_else(|| SnsError::NotFound(format!("Blob not found: {}", cid)))?;

    let etag = format!("\"{}\"", cid);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH) {
        if if_none_match.to_str().map(|v| v == etag).unwrap_or(false) {
            return Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, etag)
                .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
                .body(axum::body::Body::empty())
                .map_err(|e| SnsError::Internal(format!("Failed to build response: {}", e)));
        }
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(axum::body::Body::from(data))
        .map_err(|e| SnsError::Internal(format!("Failed to build response: {}", e)))
}

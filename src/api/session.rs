/// Session endpoints: sign in, refresh, sign out, resume
use crate::{
    account::{CreateSessionRequest, RefreshSessionRequest, SessionInfo, SessionResponse},
    api::middleware,
    context::AppContext,
    error::SnsResult,
};
use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};

/// Build session routes
pub fn routes() -> Router<AppContext> {
    Router::new().route(
        "/api/session",
        post(create_session).get(get_session).delete(delete_session),
    )
    .route("/api/session/refresh", post(refresh_session))
}

/// Sign in with email and password
///
/// The response carries `hasProfile` so a client can detect profile limbo
/// and drop back into signup instead of the feed.
async fn create_session(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateSessionRequest>,
) -> SnsResult<Json<SessionResponse>> {
    let (account, session) = ctx.account_manager.login(&req.email, &req.password).await?;

    let has_profile = ctx.account_manager.has_profile(&account.id).await?;

    tracing::info!(account_id = %account.id, has_profile, "Session created");

    Ok(Json(SessionResponse {
        account_id: account.id,
        email: account.email,
        access_jwt: session.access_token,
        refresh_jwt: session.refresh_token,
        has_profile,
    }))
}

/// Get current session info, including the profile-limbo check
async fn get_session(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> SnsResult<Json<SessionInfo>> {
    let validated = middleware::require_auth(State(ctx.clone()), headers).await?;

    let account = ctx.account_manager.get_account(&validated.account_id).await?;
    let profile = ctx.profile_manager.get_profile(&account.id).await?;

    Ok(Json(SessionInfo {
        account_id: account.id,
        email: account.email,
        has_profile: profile.is_some(),
        profile,
    }))
}

/// Sign out: revoke the current session
async fn delete_session(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> SnsResult<Json<serde_json::Value>> {
    let validated = middleware::require_auth(State(ctx.clone()), headers).await?;

    ctx.account_manager
        .delete_session(&validated.session_id)
        .await?;

    Ok(Json(serde_json::json!({})))
}

/// Rotate the token pair using a refresh token
async fn refresh_session(
    State(ctx): State<AppContext>,
    Json(req): Json<RefreshSessionRequest>,
) -> SnsResult<Json<SessionResponse>> {
    let session = ctx.account_manager.refresh_session(&req.refresh_jwt).await?;

    let account = ctx.account_manager.get_account(&session.account_id).await?;
    let has_profile = ctx.account_manager.has_profile(&account.id).await?;

    Ok(Json(SessionResponse {
        account_id: account.id,
        email: account.email,
        access_jwt: session.access_token,
        refresh_jwt: session.refresh_token,
        has_profile,
    }))
}

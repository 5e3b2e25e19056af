/// Profile endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    db::models::Profile,
    error::{SnsError, SnsResult},
    profile::ProfileView,
    validation,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

/// Build profile routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/profiles/availability", get(check_availability))
        .route("/api/profiles/:account_id", get(get_profile))
        .route("/api/profiles/bio", put(update_bio))
        .route("/api/profiles/avatar", put(update_avatar))
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    username: String,
}

/// Advisory username probe
///
/// A malformed username reports unavailable rather than erroring, so a
/// client can poll this as the user types. The UNIQUE constraint at profile
/// creation remains the authority.
async fn check_availability(
    State(ctx): State<AppContext>,
    Query(query): Query<AvailabilityQuery>,
) -> SnsResult<Json<serde_json::Value>> {
    let available = match validation::validate_username(&query.username) {
        Ok(()) => ctx.profile_manager.username_available(&query.username).await?,
        Err(_) => false,
    };

    Ok(Json(serde_json::json!({ "available": available })))
}

/// Get a profile with its post and follow counts
async fn get_profile(
    State(ctx): State<AppContext>,
    Path(account_id): Path<String>,
) -> SnsResult<Json<ProfileView>> {
    let view = ctx
        .profile_manager
        .get_profile_view(&account_id)
        .await?
        .ok_or_else(|| SnsError::NotFound("Profile not found".to_string()))?;

    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct UpdateBioRequest {
    bio: String,
}

/// Update the caller's own bio
async fn update_bio(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<UpdateBioRequest>,
) -> SnsResult<Json<Profile>> {
    let profile = ctx
        .profile_manager
        .update_bio(&auth.account_id, &req.bio)
        .await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAvatarRequest {
    avatar_url: String,
}

/// Update the caller's own avatar to a previously uploaded image
async fn update_avatar(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<UpdateAvatarRequest>,
) -> SnsResult<Json<Profile>> {
    let profile = ctx
        .profile_manager
        .update_avatar(&auth.account_id, &req.avatar_url)
        .await?;

    Ok(Json(profile))
}

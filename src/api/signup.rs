/// Multi-step signup endpoints
///
/// Step handlers delegate to the signup orchestrator; the current step is
/// always derived server-side, so a stale client cannot push the flow into
/// an illegal transition.
use crate::{
    auth::AuthContext,
    context::AppContext,
    db::models::Profile,
    error::SnsResult,
    metrics,
    signup::SignupStep,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Build signup routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/signup/credentials", post(submit_credentials))
        .route("/api/signup/profile", post(submit_profile))
        .route("/api/signup/complete", post(complete_signup))
        .route("/api/signup/state", get(signup_state))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest {
    email: String,
    password: String,
    password_confirmation: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsResponse {
    step: SignupStep,
    account_id: String,
    access_jwt: String,
    refresh_jwt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileStepRequest {
    username: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    username: String,
    display_name: String,
    avatar_url: Option<String>,
    #[serde(default)]
    skip_avatar: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteResponse {
    step: SignupStep,
    profile: Profile,
}

#[derive(Debug, Serialize)]
struct StepResponse {
    step: SignupStep,
}

/// Step 1: create the account and sign in
async fn submit_credentials(
    State(ctx): State<AppContext>,
    Json(req): Json<CredentialsRequest>,
) -> SnsResult<Json<CredentialsResponse>> {
    let started = ctx
        .signup
        .submit_credentials(&req.email, &req.password, &req.password_confirmation)
        .await?;

    metrics::record_signup_step("credentials");

    Ok(Json(CredentialsResponse {
        step: started.step,
        account_id: started.account.id,
        access_jwt: started.session.access_token,
        refresh_jwt: started.session.refresh_token,
    }))
}

/// Step 2: validate the chosen username and display name
async fn submit_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ProfileStepRequest>,
) -> SnsResult<Json<StepResponse>> {
    let step = ctx
        .signup
        .submit_profile(&auth.account_id, &req.username, &req.display_name)
        .await?;

    metrics::record_signup_step("profile");

    Ok(Json(StepResponse { step }))
}

/// Step 3: create the profile, with or without an avatar
async fn complete_signup(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CompleteRequest>,
) -> SnsResult<Json<CompleteResponse>> {
    let profile = ctx
        .signup
        .complete(
            &auth.account_id,
            &req.username,
            &req.display_name,
            req.avatar_url,
            req.skip_avatar,
        )
        .await?;

    metrics::record_signup_step("complete");

    Ok(Json(CompleteResponse {
        step: SignupStep::Complete,
        profile,
    }))
}

/// Resume: report the caller's current signup step
async fn signup_state(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> SnsResult<Json<StepResponse>> {
    let step = ctx.signup.resume_step(&auth.account_id).await?;

    Ok(Json(StepResponse { step }))
}

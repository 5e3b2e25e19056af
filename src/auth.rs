/// Authentication extractors
use crate::{
    account::ValidatedSession, api::middleware::extract_bearer_token, context::AppContext,
    error::SnsError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates session from request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: String,
    pub session: ValidatedSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = SnsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| SnsError::Authentication("Missing authorization header".to_string()))?;

        let session = state.account_manager.validate_access_token(&token).await?;

        let account_id = session.account_id.clone();

        Ok(AuthContext {
            account_id,
            session,
        })
    }
}

/// Optional authenticated context - does not fail if no auth provided
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub auth: Option<AuthContext>,
}

impl OptionalAuthContext {
    /// The viewer's account id, when authenticated
    pub fn account_id(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.account_id.as_str())
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = SnsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers);

        let auth = if let Some(token) = token {
            match state.account_manager.validate_access_token(&token).await {
                Ok(session) => {
                    let account_id = session.account_id.clone();
                    Some(AuthContext {
                        account_id,
                        session,
                    })
                }
                Err(_) => None,
            }
        } else {
            None
        };

        Ok(OptionalAuthContext { auth })
    }
}

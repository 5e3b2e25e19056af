/// Rate Limiting System
use crate::error::{SnsError, SnsResult};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Rate limiter settings
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Requests per minute for authenticated callers
    pub authenticated_rpm: u32,
    /// Requests per minute for unauthenticated callers
    pub unauthenticated_rpm: u32,
    /// Burst size
    pub burst_size: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_rpm: 3000,
            unauthenticated_rpm: 600,
            burst_size: 50,
        }
    }
}

impl RateLimitSettings {
    /// Derive tier quotas from the configured global budget
    pub fn from_config(config: &crate::config::RateLimitConfig) -> Self {
        let defaults = Self::default();
        Self {
            enabled: config.enabled,
            authenticated_rpm: config.global_requests_per_minute,
            unauthenticated_rpm: (config.global_requests_per_minute / 5).max(1),
            burst_size: defaults.burst_size,
        }
    }
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    unauthenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        let auth_quota = Quota::per_minute(
            NonZeroU32::new(settings.authenticated_rpm).unwrap_or(NonZeroU32::new(3000).unwrap()),
        )
        .allow_burst(NonZeroU32::new(settings.burst_size).unwrap_or(NonZeroU32::new(50).unwrap()));

        let unauth_quota = Quota::per_minute(
            NonZeroU32::new(settings.unauthenticated_rpm).unwrap_or(NonZeroU32::new(600).unwrap()),
        )
        .allow_burst(
            NonZeroU32::new(settings.burst_size / 5).unwrap_or(NonZeroU32::new(10).unwrap()),
        );

        Self {
            enabled: settings.enabled,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            unauthenticated: Arc::new(GovernorLimiter::direct(unauth_quota)),
        }
    }

    /// Check rate limit for an authenticated caller
    pub fn check_authenticated(&self) -> SnsResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.authenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(SnsError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }

    /// Check rate limit for an unauthenticated caller
    pub fn check_unauthenticated(&self) -> SnsResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.unauthenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(SnsError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }
}

/// Rate limiting middleware
///
/// Callers presenting an Authorization header draw from the larger
/// authenticated quota; the token itself is validated later by the handler's
/// extractor.
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, SnsError> {
    let has_auth_header = request.headers().get("authorization").is_some();

    if has_auth_header {
        ctx.rate_limiter.check_authenticated()?;
    } else {
        ctx.rate_limiter.check_unauthenticated()?;
    }

    Ok(next.run(request).await)
}

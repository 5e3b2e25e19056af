/// Configuration management for the Okashi Feed server
use crate::error::{SnsError, SnsResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Public base URL used when building blob URLs returned to clients
    pub public_url: String,
    pub version: String,
    pub blob_upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub blob_directory: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: i64,
}

/// Admin bootstrap configuration
///
/// When all three values are set, the account is created (or elevated) with
/// the admin flag at startup. Replaces the original deployment's seed script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub global_requests_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> SnsResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("OKASHI_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("OKASHI_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| SnsError::Validation("Invalid port number".to_string()))?;

        let public_url = env::var("OKASHI_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));
        let version = env::var("OKASHI_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let blob_upload_limit = env::var("OKASHI_BLOB_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "5242880".to_string())
            .parse()
            .unwrap_or(5242880);

        let data_directory: PathBuf = env::var("OKASHI_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("OKASHI_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("okashi.sqlite"));
        let blob_directory = env::var("OKASHI_BLOB_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("blobs"));

        let jwt_secret = env::var("OKASHI_JWT_SECRET")
            .map_err(|_| SnsError::Validation("JWT secret required".to_string()))?;
        let access_token_ttl = env::var("OKASHI_ACCESS_TOKEN_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);
        let refresh_token_ttl = env::var("OKASHI_REFRESH_TOKEN_TTL")
            .unwrap_or_else(|_| (180 * 24 * 3600).to_string())
            .parse()
            .unwrap_or(180 * 24 * 3600);

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();
        let admin_username = env::var("ADMIN_USERNAME").ok();

        let rate_limit_enabled = env::var("OKASHI_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let rate_limit_requests = env::var("OKASHI_RATE_LIMIT_GLOBAL_REQUESTS_PER_MINUTE")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                version,
                blob_upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                database,
                blob_directory,
            },
            authentication: AuthConfig {
                jwt_secret,
                access_token_ttl,
                refresh_token_ttl,
            },
            admin: AdminConfig {
                email: admin_email,
                password: admin_password,
                username: admin_username,
            },
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                global_requests_per_minute: rate_limit_requests,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SnsResult<()> {
        if self.service.hostname.is_empty() {
            return Err(SnsError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(SnsError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.admin.password.is_some() != self.admin.email.is_some() {
            return Err(SnsError::Validation(
                "Admin bootstrap requires both ADMIN_EMAIL and ADMIN_PASSWORD".to_string(),
            ));
        }

        Ok(())
    }
}

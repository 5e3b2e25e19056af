/// Account manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::ValidatedSession,
    config::ServerConfig,
    db::models::{Account, Session},
    error::{is_unique_violation, SnsError, SnsResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Create a new account from verified credentials
    ///
    /// Email uniqueness is enforced by the storage layer; a violation is
    /// normalized to a Conflict error rather than pre-checked.
    pub async fn create_account(&self, email: &str, password: &str) -> SnsResult<Account> {
        self.validate_email(email)?;

        let password_hash = Self::hash_password(password)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO account (id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(email)
        .bind(&password_hash)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SnsError::Conflict("Email already registered".to_string())
            } else {
                SnsError::Database(e)
            }
        })?;

        tracing::info!(account_id = %id, "Created account");

        Ok(Account {
            id,
            email: email.to_string(),
            password_hash,
            created_at: now,
        })
    }

    /// Authenticate credentials and create a session
    pub async fn login(&self, email: &str, password: &str) -> SnsResult<(Account, Session)> {
        let account = self
            .find_account_by_email(email)
            .await?
            .ok_or_else(|| SnsError::Authentication("Invalid credentials".to_string()))?;

        // Verify password
        let valid = Self::verify_password(password, &account.password_hash)?;

        if !valid {
            return Err(SnsError::Authentication("Invalid credentials".to_string()));
        }

        // Create session
        let session = self.create_session(&account.id).await?;

        Ok((account, session))
    }

    /// Create a session for an account
    pub async fn create_session(&self, account_id: &str) -> SnsResult<Session> {
        let session_id = Uuid::new_v4().to_string();

        // Generate JWT tokens
        let access_token = self.generate_access_token(account_id, &session_id)?;
        let refresh_token_str = self.generate_refresh_token(account_id, &session_id)?;

        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.authentication.access_token_ttl);

        // Insert session
        sqlx::query(
            "INSERT INTO session (id, account_id, access_token, refresh_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&session_id)
        .bind(account_id)
        .bind(&access_token)
        .bind(&refresh_token_str)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        // Store refresh token
        let refresh_token_id = Uuid::new_v4().to_string();
        let refresh_expires = now + Duration::seconds(self.config.authentication.refresh_token_ttl);

        sqlx::query(
            "INSERT INTO refresh_token (id, account_id, token, created_at, expires_at, used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&refresh_token_id)
        .bind(account_id)
        .bind(&refresh_token_str)
        .bind(now)
        .bind(refresh_expires)
        .bind(false)
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(Session {
            id: session_id,
            account_id: account_id.to_string(),
            access_token,
            refresh_token: refresh_token_str,
            created_at: now,
            expires_at,
        })
    }

    /// Validate access token and return session info
    pub async fn validate_access_token(&self, token: &str) -> SnsResult<ValidatedSession> {
        // Find session by access token
        let row = sqlx::query("SELECT id, account_id, expires_at FROM session WHERE access_token = ?1")
            .bind(token)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?
            .ok_or_else(|| SnsError::Authentication("Invalid or expired session".to_string()))?;

        let session_id: String = row.get("id");
        let account_id: String = row.get("account_id");
        let expires_at: DateTime<Utc> = row.get("expires_at");

        // Check expiration
        if Utc::now() > expires_at {
            return Err(SnsError::Authentication("Session expired".to_string()));
        }

        Ok(ValidatedSession {
            account_id,
            session_id,
        })
    }

    /// Delete a session (sign-out)
    pub async fn delete_session(&self, session_id: &str) -> SnsResult<()> {
        sqlx::query("DELETE FROM session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        Ok(())
    }

    /// Refresh session tokens
    ///
    /// Refresh tokens are single-use: a replayed token is rejected.
    pub async fn refresh_session(&self, refresh_token: &str) -> SnsResult<Session> {
        let row = sqlx::query(
            "SELECT id, account_id, expires_at, used FROM refresh_token WHERE token = ?1",
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?
        .ok_or_else(|| SnsError::Authentication("Invalid refresh token".to_string()))?;

        let token_id: String = row.get("id");
        let account_id: String = row.get("account_id");
        let expires_at: DateTime<Utc> = row.get("expires_at");
        let used: bool = row.get("used");

        if used {
            return Err(SnsError::Authentication(
                "Refresh token already used".to_string(),
            ));
        }

        if Utc::now() > expires_at {
            return Err(SnsError::Authentication("Refresh token expired".to_string()));
        }

        // Mark old refresh token as used
        sqlx::query("UPDATE refresh_token SET used = TRUE, used_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(&token_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        // Create new session
        self.create_session(&account_id).await
    }

    /// Get account by id
    pub async fn get_account(&self, account_id: &str) -> SnsResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM account WHERE id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?
        .ok_or_else(|| SnsError::NotFound("Account not found".to_string()))?;

        Ok(account)
    }

    /// Find account by email
    pub async fn find_account_by_email(&self, email: &str) -> SnsResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM account WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(account)
    }

    /// Check whether the account has completed signup with a profile
    ///
    /// False means the account is in profile limbo and should resume the
    /// signup flow at the Profile step.
    pub async fn has_profile(&self, account_id: &str) -> SnsResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile WHERE id = ?1")
            .bind(account_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        Ok(count > 0)
    }

    /// Cleanup expired sessions and refresh tokens
    ///
    /// This should be called periodically (e.g., hourly) to remove expired
    /// tokens from the database.
    ///
    /// Returns (sessions_deleted, refresh_tokens_deleted)
    pub async fn cleanup_expired_sessions(&self) -> SnsResult<(u64, u64)> {
        let now = Utc::now();

        let sessions_result = sqlx::query("DELETE FROM session WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        let sessions_deleted = sessions_result.rows_affected();

        let refresh_result = sqlx::query("DELETE FROM refresh_token WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        let refresh_tokens_deleted = refresh_result.rows_affected();

        if sessions_deleted > 0 || refresh_tokens_deleted > 0 {
            tracing::info!(
                sessions_deleted,
                refresh_tokens_deleted,
                "Cleaned up expired tokens"
            );
        } else {
            tracing::debug!("Session cleanup: no expired tokens found");
        }

        Ok((sessions_deleted, refresh_tokens_deleted))
    }

    /// Hash a password with Argon2id
    fn hash_password(password: &str) -> SnsResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SnsError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored Argon2id hash
    fn verify_password(password: &str, stored_hash: &str) -> SnsResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| SnsError::Internal(format!("Stored password hash invalid: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Generate access JWT token
    fn generate_access_token(&self, account_id: &str, session_id: &str) -> SnsResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        struct Claims {
            sub: String,
            sid: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            sid: session_id.to_string(),
            iat: now,
            exp: now + self.config.authentication.access_token_ttl,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| SnsError::Jwt(format!("Failed to generate token: {}", e)))?;

        Ok(token)
    }

    /// Generate refresh JWT token
    fn generate_refresh_token(&self, account_id: &str, session_id: &str) -> SnsResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        struct RefreshClaims {
            sub: String,
            sid: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: account_id.to_string(),
            sid: session_id.to_string(),
            iat: now,
            exp: now + self.config.authentication.refresh_token_ttl,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| SnsError::Jwt(format!("Failed to generate refresh token: {}", e)))?;

        Ok(token)
    }

    /// Validate email format
    fn validate_email(&self, email: &str) -> SnsResult<()> {
        if !email.contains('@') {
            return Err(SnsError::Validation("Invalid email format".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use std::path::PathBuf;

    async fn create_test_manager() -> AccountManager {
        // Create in-memory database
        let db = SqlitePool::connect(":memory:").await.unwrap();

        // Create tables
        sqlx::query(
            r#"
            CREATE TABLE account (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE session (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                access_token TEXT UNIQUE NOT NULL,
                refresh_token TEXT UNIQUE NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                FOREIGN KEY (account_id) REFERENCES account(id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE refresh_token (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                token TEXT UNIQUE NOT NULL,
                created_at DATETIME NOT NULL,
                expires_at DATETIME NOT NULL,
                used BOOLEAN NOT NULL DEFAULT 0,
                used_at DATETIME,
                FOREIGN KEY (account_id) REFERENCES account(id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE profile (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                bio TEXT,
                is_admin BOOLEAN NOT NULL DEFAULT 0,
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (id) REFERENCES account(id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        let config = Arc::new(test_config());

        AccountManager::new(db, config)
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                version: "0.1.0".to_string(),
                blob_upload_limit: 5242880,
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
                blob_directory: PathBuf::from("./data/blobs"),
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-key-for-testing-only".to_string(),
                access_token_ttl: 3600,
                refresh_token_ttl: 180 * 24 * 3600,
            },
            admin: AdminConfig {
                email: None,
                password: None,
                username: None,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                global_requests_per_minute: 3000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_account_and_login() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();
        assert_eq!(account.email, "alice@example.com");
        assert_ne!(account.password_hash, "abc12345");

        let (logged_in, session) = manager.login("alice@example.com", "abc12345").await.unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(!session.access_token.is_empty());
        assert!(!session.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let manager = create_test_manager().await;

        manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();

        let wrong_password = manager.login("alice@example.com", "wrong1234").await;
        assert!(matches!(
            wrong_password,
            Err(SnsError::Authentication(_))
        ));

        let unknown_email = manager.login("nobody@example.com", "abc12345").await;
        assert!(matches!(unknown_email, Err(SnsError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let manager = create_test_manager().await;

        manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();

        let dup = manager.create_account("alice@example.com", "xyz67890").await;
        assert!(matches!(dup, Err(SnsError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_validate_and_delete_session() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();
        let session = manager.create_session(&account.id).await.unwrap();

        let validated = manager
            .validate_access_token(&session.access_token)
            .await
            .unwrap();
        assert_eq!(validated.account_id, account.id);
        assert_eq!(validated.session_id, session.id);

        manager.delete_session(&session.id).await.unwrap();

        let after_delete = manager.validate_access_token(&session.access_token).await;
        assert!(matches!(after_delete, Err(SnsError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();
        let session = manager.create_session(&account.id).await.unwrap();

        let rotated = manager
            .refresh_session(&session.refresh_token)
            .await
            .unwrap();
        assert_ne!(rotated.access_token, session.access_token);

        // Replaying the old refresh token must fail
        let replay = manager.refresh_session(&session.refresh_token).await;
        assert!(matches!(replay, Err(SnsError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_has_profile_reflects_limbo() {
        let manager = create_test_manager().await;

        let account = manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();

        assert!(!manager.has_profile(&account.id).await.unwrap());

        sqlx::query(
            "INSERT INTO profile (id, username, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&account.id)
        .bind("alice_1")
        .bind("Alice")
        .bind(Utc::now())
        .execute(&manager.db)
        .await
        .unwrap();

        assert!(manager.has_profile(&account.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let manager = create_test_manager().await;
        let now = Utc::now();

        let account = manager
            .create_account("alice@example.com", "abc12345")
            .await
            .unwrap();

        // Insert expired session (expired 1 hour ago)
        sqlx::query(
            "INSERT INTO session (id, account_id, access_token, refresh_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind("expired-session-1")
        .bind(&account.id)
        .bind("expired-access-token-1")
        .bind("expired-refresh-token-1")
        .bind(now - Duration::hours(2))
        .bind(now - Duration::hours(1))
        .execute(&manager.db)
        .await
        .unwrap();

        // Valid session from the normal path
        let valid = manager.create_session(&account.id).await.unwrap();

        // Expired refresh token
        sqlx::query(
            "INSERT INTO refresh_token (id, account_id, token, created_at, expires_at, used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind("expired-refresh-1")
        .bind(&account.id)
        .bind("old-refresh-token-1")
        .bind(now - Duration::days(200))
        .bind(now - Duration::days(20))
        .bind(false)
        .execute(&manager.db)
        .await
        .unwrap();

        let (sessions_deleted, refresh_tokens_deleted) =
            manager.cleanup_expired_sessions().await.unwrap();

        assert_eq!(sessions_deleted, 1, "Should delete 1 expired session");
        assert_eq!(refresh_tokens_deleted, 1, "Should delete 1 expired refresh token");

        // The valid session still works
        assert!(manager
            .validate_access_token(&valid.access_token)
            .await
            .is_ok());
    }
}

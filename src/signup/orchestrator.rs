/// Signup orchestrator: drives the credentials/profile/avatar flow over the
/// identity and profile stores
use crate::{
    account::AccountManager,
    config::ServerConfig,
    db::models::Profile,
    error::{SnsError, SnsResult},
    profile::ProfileManager,
    signup::{SignupStep, StartedSignup},
    validation,
};
use std::sync::Arc;

/// Signup orchestrator service
///
/// Holds no per-signup state of its own. Each operation re-derives where the
/// caller stands from storage, so an abandoned flow can resume on any
/// instance.
pub struct SignupOrchestrator {
    accounts: Arc<AccountManager>,
    profiles: Arc<ProfileManager>,
    config: Arc<ServerConfig>,
}

impl SignupOrchestrator {
    /// Create a new orchestrator over the identity and profile stores
    pub fn new(
        accounts: Arc<AccountManager>,
        profiles: Arc<ProfileManager>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            config,
        }
    }

    /// Step 1: create the account and sign the caller in
    ///
    /// Password policy and confirmation equality are checked before the
    /// account exists. There is no email confirmation gate; the fresh
    /// credentials authenticate immediately.
    pub async fn submit_credentials(
        &self,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> SnsResult<StartedSignup> {
        validation::validate_password(password)?;
        validation::validate_password_confirmation(password, password_confirmation)?;

        self.accounts.create_account(email, password).await?;
        let (account, session) = self.accounts.login(email, password).await?;

        tracing::info!(account_id = %account.id, "Signup started");

        Ok(StartedSignup {
            step: SignupStep::Profile,
            account,
            session,
        })
    }

    /// Step 2: validate the chosen username and display name
    ///
    /// The availability probe here is advisory. Nothing is written; the
    /// storage-level UNIQUE constraint at the complete step still decides
    /// races.
    pub async fn submit_profile(
        &self,
        account_id: &str,
        username: &str,
        display_name: &str,
    ) -> SnsResult<SignupStep> {
        let current = self.resume_step(account_id).await?;
        if !current.can_transition_to(SignupStep::Avatar) {
            return Err(SnsError::Conflict("Signup already complete".to_string()));
        }

        validation::validate_username(username)?;
        validation::validate_display_name(display_name)?;

        if !self.profiles.username_available(username).await? {
            return Err(SnsError::Conflict("Username already taken".to_string()));
        }

        Ok(SignupStep::Avatar)
    }

    /// Step 3: create the profile, with or without an avatar
    ///
    /// The finish path requires a chosen image; the skip path never does.
    /// A failure here leaves the account in place; profile limbo is a valid,
    /// resumable state.
    pub async fn complete(
        &self,
        account_id: &str,
        username: &str,
        display_name: &str,
        avatar_url: Option<String>,
        skip_avatar: bool,
    ) -> SnsResult<Profile> {
        let current = self.resume_step(account_id).await?;
        if current == SignupStep::Complete {
            return Err(SnsError::Conflict("Signup already complete".to_string()));
        }

        if !skip_avatar && avatar_url.is_none() {
            return Err(SnsError::Validation(
                "Avatar image is required unless skipped".to_string(),
            ));
        }
        let avatar_url = if skip_avatar { None } else { avatar_url };

        let profile = self
            .profiles
            .create_profile(account_id, username, display_name, avatar_url)
            .await?;

        tracing::info!(account_id = %account_id, username = %username, "Signup complete");

        Ok(profile)
    }

    /// Where an authenticated account stands in the flow
    ///
    /// Accounts are only ever observed past the credentials step here, so
    /// this is a two-way split: profile exists means done, otherwise the
    /// caller owes us a profile.
    pub async fn resume_step(&self, account_id: &str) -> SnsResult<SignupStep> {
        if self.accounts.has_profile(account_id).await? {
            Ok(SignupStep::Complete)
        } else {
            Ok(SignupStep::Profile)
        }
    }

    /// Startup admin bootstrap
    ///
    /// When ADMIN_EMAIL and ADMIN_PASSWORD are configured, create the account
    /// and profile if missing and raise the admin flag. Safe to run on every
    /// boot.
    pub async fn ensure_admin(&self) -> SnsResult<()> {
        let (email, password) = match (&self.config.admin.email, &self.config.admin.password) {
            (Some(email), Some(password)) => (email.clone(), password.clone()),
            _ => {
                tracing::debug!("Admin bootstrap not configured, skipping");
                return Ok(());
            }
        };

        let account = match self.accounts.find_account_by_email(&email).await? {
            Some(account) => account,
            None => {
                tracing::info!(email = %email, "Creating admin account");
                self.accounts.create_account(&email, &password).await?
            }
        };

        if !self.accounts.has_profile(&account.id).await? {
            let username = self
                .config
                .admin
                .username
                .clone()
                .unwrap_or_else(|| "admin".to_string());
            self.profiles
                .create_profile(&account.id, &username, &username, None)
                .await?;
        }

        self.profiles.set_admin(&account.id, true).await?;

        tracing::info!(account_id = %account.id, "Admin account ready");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use sqlx::SqlitePool;
    use std::path::PathBuf;

    async fn create_test_pool() -> SqlitePool {
        let db = SqlitePool::connect(":memory:").await.unwrap();

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
                expires_at DATETIME NOT NULL
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
                used_at DATETIME
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
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        db
    }

    fn test_config(admin: AdminConfig) -> ServerConfig {
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
            admin,
            rate_limit: RateLimitConfig {
                enabled: true,
                global_requests_per_minute: 3000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    async fn create_orchestrator(admin: AdminConfig) -> SignupOrchestrator {
        let db = create_test_pool().await;
        let config = Arc::new(test_config(admin));
        let accounts = Arc::new(AccountManager::new(db.clone(), config.clone()));
        let profiles = Arc::new(ProfileManager::new(db));
        SignupOrchestrator::new(accounts, profiles, config)
    }

    fn no_admin() -> AdminConfig {
        AdminConfig {
            email: None,
            password: None,
            username: None,
        }
    }

    #[tokio::test]
    async fn test_full_signup_flow() {
        let orchestrator = create_orchestrator(no_admin()).await;

        let started = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12345")
            .await
            .unwrap();
        assert_eq!(started.step, SignupStep::Profile);
        assert!(!started.session.access_token.is_empty());

        let account_id = started.account.id.clone();
        assert_eq!(
            orchestrator.resume_step(&account_id).await.unwrap(),
            SignupStep::Profile
        );

        let next = orchestrator
            .submit_profile(&account_id, "alice_1", "Alice")
            .await
            .unwrap();
        assert_eq!(next, SignupStep::Avatar);

        let profile = orchestrator
            .complete(&account_id, "alice_1", "Alice", None, true)
            .await
            .unwrap();
        assert_eq!(profile.username, "alice_1");
        assert!(profile.avatar_url.is_none());

        assert_eq!(
            orchestrator.resume_step(&account_id).await.unwrap(),
            SignupStep::Complete
        );
    }

    #[tokio::test]
    async fn test_password_policy_blocks_account_creation() {
        let orchestrator = create_orchestrator(no_admin()).await;

        // Too short, no digit, no letter
        for bad in ["abc1234", "abcdefgh", "12345678"] {
            let result = orchestrator
                .submit_credentials("alice@example.com", bad, bad)
                .await;
            assert!(matches!(result, Err(SnsError::Validation(_))), "{}", bad);
        }

        let mismatch = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12346")
            .await;
        assert!(matches!(mismatch, Err(SnsError::Validation(_))));

        // Nothing was created along the way
        let ok = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12345")
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_profile_step_checks_availability() {
        let orchestrator = create_orchestrator(no_admin()).await;

        let first = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12345")
            .await
            .unwrap();
        orchestrator
            .submit_profile(&first.account.id, "snack_fan", "Alice")
            .await
            .unwrap();
        orchestrator
            .complete(&first.account.id, "snack_fan", "Alice", None, true)
            .await
            .unwrap();

        let second = orchestrator
            .submit_credentials("bob@example.com", "abc12345", "abc12345")
            .await
            .unwrap();

        let taken = orchestrator
            .submit_profile(&second.account.id, "snack_fan", "Bob")
            .await;
        assert!(matches!(taken, Err(SnsError::Conflict(_))));

        let bad_pattern = orchestrator
            .submit_profile(&second.account.id, "b!", "Bob")
            .await;
        assert!(matches!(bad_pattern, Err(SnsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_finish_requires_avatar_unless_skipped() {
        let orchestrator = create_orchestrator(no_admin()).await;

        let started = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12345")
            .await
            .unwrap();
        let account_id = started.account.id;

        let missing = orchestrator
            .complete(&account_id, "alice_1", "Alice", None, false)
            .await;
        assert!(matches!(missing, Err(SnsError::Validation(_))));

        // The account survives the failed step and can still finish
        assert_eq!(
            orchestrator.resume_step(&account_id).await.unwrap(),
            SignupStep::Profile
        );

        let profile = orchestrator
            .complete(
                &account_id,
                "alice_1",
                "Alice",
                Some("http://localhost:8080/blobs/abc".to_string()),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("http://localhost:8080/blobs/abc")
        );
    }

    #[tokio::test]
    async fn test_completed_signup_rejects_replays() {
        let orchestrator = create_orchestrator(no_admin()).await;

        let started = orchestrator
            .submit_credentials("alice@example.com", "abc12345", "abc12345")
            .await
            .unwrap();
        let account_id = started.account.id;

        orchestrator
            .complete(&account_id, "alice_1", "Alice", None, true)
            .await
            .unwrap();

        let profile_again = orchestrator
            .submit_profile(&account_id, "alice_2", "Alice")
            .await;
        assert!(matches!(profile_again, Err(SnsError::Conflict(_))));

        let complete_again = orchestrator
            .complete(&account_id, "alice_2", "Alice", None, true)
            .await;
        assert!(matches!(complete_again, Err(SnsError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_bootstraps_and_is_idempotent() {
        let orchestrator = create_orchestrator(AdminConfig {
            email: Some("admin@example.com".to_string()),
            password: Some("admin1234".to_string()),
            username: Some("granny".to_string()),
        })
        .await;

        orchestrator.ensure_admin().await.unwrap();
        orchestrator.ensure_admin().await.unwrap();

        let account = orchestrator
            .accounts
            .find_account_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        let profile = orchestrator
            .profiles
            .get_profile(&account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.username, "granny");
        assert!(profile.is_admin);
    }

    #[tokio::test]
    async fn test_ensure_admin_elevates_existing_account() {
        let orchestrator = create_orchestrator(AdminConfig {
            email: Some("admin@example.com".to_string()),
            password: Some("admin1234".to_string()),
            username: None,
        })
        .await;

        // The account signed up normally beforehand
        let started = orchestrator
            .submit_credentials("admin@example.com", "admin1234", "admin1234")
            .await
            .unwrap();
        orchestrator
            .complete(&started.account.id, "already_here", "Admin", None, true)
            .await
            .unwrap();

        orchestrator.ensure_admin().await.unwrap();

        let profile = orchestrator
            .profiles
            .get_profile(&started.account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.username, "already_here");
        assert!(profile.is_admin);
    }

    #[tokio::test]
    async fn test_ensure_admin_noop_without_config() {
        let orchestrator = create_orchestrator(no_admin()).await;
        orchestrator.ensure_admin().await.unwrap();
    }
}

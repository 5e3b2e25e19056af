/// Application context and dependency injection
use crate::{
    account::AccountManager,
    blob_store::BlobStore,
    config::ServerConfig,
    content::PostManager,
    db,
    error::{SnsError, SnsResult},
    feed::FeedManager,
    graph::GraphManager,
    profile::ProfileManager,
    rate_limit::{RateLimitSettings, RateLimiter},
    reactions::ReactionManager,
    signup::SignupOrchestrator,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub profile_manager: Arc<ProfileManager>,
    pub post_manager: Arc<PostManager>,
    pub graph_manager: Arc<GraphManager>,
    pub reaction_manager: Arc<ReactionManager>,
    pub feed_manager: Arc<FeedManager>,
    pub signup: Arc<SignupOrchestrator>,
    pub blob_store: Arc<BlobStore>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> SnsResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let config = Arc::new(config);

        let account_manager = Arc::new(AccountManager::new(db.clone(), config.clone()));
        let profile_manager = Arc::new(ProfileManager::new(db.clone()));
        let post_manager = Arc::new(PostManager::new(db.clone()));
        let graph_manager = Arc::new(GraphManager::new(db.clone()));
        let reaction_manager = Arc::new(ReactionManager::new(db.clone()));
        let feed_manager = Arc::new(FeedManager::new(db.clone()));

        let signup = Arc::new(SignupOrchestrator::new(
            account_manager.clone(),
            profile_manager.clone(),
            config.clone(),
        ));

        let blob_store = Arc::new(BlobStore::new(
            config.storage.blob_directory.clone(),
            config.service.blob_upload_limit,
            db.clone(),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(RateLimitSettings::from_config(
            &config.rate_limit,
        )));

        Ok(Self {
            config,
            db,
            account_manager,
            profile_manager,
            post_manager,
            graph_manager,
            reaction_manager,
            feed_manager,
            signup,
            blob_store,
            rate_limiter,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> SnsResult<()> {
        let dirs = [&config.storage.data_directory, &config.storage.blob_directory];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    SnsError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    /// Public URL for a stored blob
    pub fn blob_url(&self, cid: &str) -> String {
        format!("{}/blobs/{}", self.config.service.public_url, cid)
    }
}

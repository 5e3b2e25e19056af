use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::metrics;

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
    started: Instant,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self {
            context,
            started: Instant::now(),
        }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::orphaned_blob_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::uptime_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Cleanup expired sessions (runs every hour)
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(3600)); // Every hour

        loop {
            interval.tick().await;
            info!("Running expired session cleanup");
            let start = Instant::now();

            match tasks::cleanup_expired_sessions(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job(
                        "session_cleanup",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Cleaned up {} expired tokens (sessions + refresh tokens)", count);
                    } else {
                        info!("Session cleanup: no expired tokens found");
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "session_cleanup",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Failed to cleanup expired sessions: {}", e);
                }
            }
        }
    }

    /// Cleanup orphaned blobs (runs every 6 hours)
    async fn orphaned_blob_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(21600)); // Every 6 hours

        loop {
            interval.tick().await;
            info!("Running orphaned blob cleanup");
            let start = Instant::now();

            match tasks::cleanup_orphaned_blobs(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job(
                        "blob_cleanup",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Cleaned up {} orphaned blobs", count);
                    } else {
                        info!("Blob cleanup: no orphaned blobs found");
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "blob_cleanup",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Failed to cleanup orphaned blobs: {}", e);
                }
            }
        }
    }

    /// Refresh the uptime gauge (runs every minute)
    async fn uptime_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;
            metrics::UPTIME_SECONDS.set(scheduler.started.elapsed().as_secs_f64());
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                }
                Err(e) => error!("Health check failed: {}", e),
            }
        }
    }
}

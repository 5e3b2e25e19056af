/// Okashi Feed - snack discovery social feed backend
///
/// A feed service for sharing and discovering regional sweets and snacks:
/// accounts and profiles, image posts with tags, follows, reactions, and a
/// filterable timeline.

mod account;
mod api;
mod auth;
mod blob_store;
mod config;
mod content;
mod context;
mod db;
mod error;
mod feed;
mod graph;
mod jobs;
mod metrics;
mod profile;
mod rate_limit;
mod reactions;
mod server;
mod signup;
mod validation;

use config::ServerConfig;
use context::AppContext;
use error::SnsResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> SnsResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "okashi_feed=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Bootstrap the configured admin account, if any
    if let Err(e) = ctx.signup.ensure_admin().await {
        tracing::warn!(error = %e, "Admin bootstrap failed");
    }

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ____  __         __    _    ______              __
  / __ \/ /______ _/ /_  (_)  / ____/__  ___  ____/ /
 / / / / //_/ __ `/ ___\/ /  / /_  / _ \/ _ \/ __  /
/ /_/ / ,< / /_/ (__  )/ /  / __/ /  __/  __/ /_/ /
\____/_/|_|\__,_/____//_/  /_/    \___/\___/\__,_/

        Snack discovery feed server v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}

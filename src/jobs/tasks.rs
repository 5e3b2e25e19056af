/// Background task implementations
use crate::{context::AppContext, error::SnsResult};

/// Cleanup expired sessions and refresh tokens
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> SnsResult<u64> {
    let (sessions_deleted, refresh_tokens_deleted) =
        ctx.account_manager.cleanup_expired_sessions().await?;

    Ok(sessions_deleted + refresh_tokens_deleted)
}

/// Cleanup blobs no post or profile references any more
///
/// Only blobs older than 24 hours are touched, so an upload that has not
/// been attached to a post yet survives the sweep.
pub async fn cleanup_orphaned_blobs(ctx: &AppContext) -> SnsResult<u64> {
    let orphaned_cids = ctx
        .blob_store
        .list_orphaned(chrono::Duration::hours(24))
        .await?;

    let mut deleted_count = 0;

    for cid in orphaned_cids {
        match ctx.blob_store.delete(&cid).await {
            Ok(_) => {
                tracing::info!(cid = %cid, "Deleted orphaned blob");
                deleted_count += 1;
            }
            Err(e) => {
                tracing::warn!(cid = %cid, error = %e, "Failed to delete orphaned blob");
            }
        }
    }

    Ok(deleted_count)
}

/// Health check - verify the database answers queries
///
/// Also refreshes the accounts gauge while it has the connection out.
pub async fn health_check(ctx: &AppContext) -> SnsResult<()> {
    let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account")
        .fetch_one(&ctx.db)
        .await?;

    crate::metrics::ACCOUNTS_TOTAL.set(accounts);

    Ok(())
}

/// Follow graph manager implementation using runtime queries
use crate::{
    error::{SnsError, SnsResult},
    graph::FollowStats,
};
use chrono::Utc;
use sqlx::SqlitePool;

/// Follow graph manager service
pub struct GraphManager {
    db: SqlitePool,
}

impl GraphManager {
    /// Create a new graph manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Flip the follow edge from follower to target
    ///
    /// Returns whether the edge exists after the call. Delete-if-present and
    /// insert-if-absent are each a single conditional statement, so two
    /// concurrent toggles cannot produce a duplicate edge.
    pub async fn toggle_follow(&self, follower_id: &str, target_id: &str) -> SnsResult<bool> {
        if follower_id == target_id {
            return Err(SnsError::Validation(
                "Cannot follow yourself".to_string(),
            ));
        }

        let target_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile WHERE id = ?1")
            .bind(target_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;
        if target_exists == 0 {
            return Err(SnsError::NotFound("Profile not found".to_string()));
        }

        let deleted = sqlx::query(
            "DELETE FROM follow WHERE follower_id = ?1 AND following_id = ?2",
        )
        .bind(follower_id)
        .bind(target_id)
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        if deleted.rows_affected() > 0 {
            tracing::debug!(follower_id = %follower_id, target_id = %target_id, "Unfollowed");
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO follow (follower_id, following_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(follower_id, following_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(target_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        tracing::debug!(follower_id = %follower_id, target_id = %target_id, "Followed");

        Ok(true)
    }

    /// Whether follower currently follows target
    pub async fn is_following(&self, follower_id: &str, target_id: &str) -> SnsResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follow WHERE follower_id = ?1 AND following_id = ?2",
        )
        .bind(follower_id)
        .bind(target_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(count > 0)
    }

    /// How many accounts follow this one
    pub async fn follower_count(&self, account_id: &str) -> SnsResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow WHERE following_id = ?1")
                .bind(account_id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        Ok(count)
    }

    /// How many accounts this one follows
    pub async fn following_count(&self, account_id: &str) -> SnsResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow WHERE follower_id = ?1")
                .bind(account_id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        Ok(count)
    }

    /// Ids of every account this one follows, for feed narrowing
    pub async fn following_ids(&self, account_id: &str) -> SnsResult<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT following_id FROM follow WHERE follower_id = ?1")
                .bind(account_id)
                .fetch_all(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        Ok(ids)
    }

    /// Counts for a profile plus the viewer's own edge state when known
    pub async fn follow_stats(
        &self,
        account_id: &str,
        viewer_id: Option<&str>,
    ) -> SnsResult<FollowStats> {
        let follower_count = self.follower_count(account_id).await?;
        let following_count = self.following_count(account_id).await?;

        let viewer_following = match viewer_id {
            Some(viewer) => Some(self.is_following(viewer, account_id).await?),
            None => None,
        };

        Ok(FollowStats {
            follower_count,
            following_count,
            viewer_following,
        })
    }
}

/// Reaction manager implementation using runtime queries
use crate::{
    db::models::ReactionKind,
    error::{SnsError, SnsResult},
    reactions::ReactionSummary,
};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

/// Reaction manager service
pub struct ReactionManager {
    db: SqlitePool,
}

impl ReactionManager {
    /// Create a new reaction manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// The fixed reaction catalog, in display order
    pub async fn list_kinds(&self) -> SnsResult<Vec<ReactionKind>> {
        let kinds = sqlx::query_as::<_, ReactionKind>(
            "SELECT id, name, emoji, sort_order FROM reaction ORDER BY sort_order",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(kinds)
    }

    /// Flip the user's membership for one reaction kind on one post
    ///
    /// Returns whether the reaction exists after the call. The composite
    /// primary key plus insert-if-absent keeps concurrent double-toggles from
    /// ever stacking a second row.
    pub async fn toggle_reaction(
        &self,
        post_id: &str,
        user_id: &str,
        reaction_id: &str,
    ) -> SnsResult<bool> {
        let kind_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reaction WHERE id = ?1")
            .bind(reaction_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;
        if kind_exists == 0 {
            return Err(SnsError::NotFound("Reaction kind not found".to_string()));
        }

        let post_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post WHERE id = ?1")
            .bind(post_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;
        if post_exists == 0 {
            return Err(SnsError::NotFound("Post not found".to_string()));
        }

        let deleted = sqlx::query(
            "DELETE FROM post_reaction WHERE post_id = ?1 AND user_id = ?2 AND reaction_id = ?3",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(reaction_id)
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO post_reaction (post_id, user_id, reaction_id, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(post_id, user_id, reaction_id) DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(reaction_id)
        .bind(chrono::Utc::now())
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(true)
    }

    /// Reaction counts for a post, keyed by kind id
    pub async fn counts_by_kind(&self, post_id: &str) -> SnsResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT reaction_id, COUNT(*) FROM post_reaction WHERE post_id = ?1 GROUP BY reaction_id",
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(rows.into_iter().collect())
    }

    /// Kind ids the user has reacted with on a post
    pub async fn user_reactions(&self, post_id: &str, user_id: &str) -> SnsResult<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT reaction_id FROM post_reaction WHERE post_id = ?1 AND user_id = ?2",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(ids.into_iter().collect())
    }

    /// Full catalog with counts and viewer state for one post
    pub async fn summarize(
        &self,
        post_id: &str,
        viewer_id: Option<&str>,
    ) -> SnsResult<Vec<ReactionSummary>> {
        let kinds = self.list_kinds().await?;
        let counts = self.counts_by_kind(post_id).await?;
        let viewer = match viewer_id {
            Some(viewer) => self.user_reactions(post_id, viewer).await?,
            None => HashSet::new(),
        };

        Ok(kinds
            .into_iter()
            .map(|kind| {
                let count = counts.get(&kind.id).copied().unwrap_or(0);
                let viewer_reacted = viewer.contains(&kind.id);
                ReactionSummary {
                    kind,
                    count,
                    viewer_reacted,
                }
            })
            .collect())
    }
}

/// Feed manager implementation using runtime queries
use crate::{
    content::PostView,
    db::models::{Post, Profile},
    error::{SnsError, SnsResult},
    feed::FeedQuery,
};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

/// Feed manager service
pub struct FeedManager {
    db: SqlitePool,
}

impl FeedManager {
    /// Create a new feed manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Run one feed query
    ///
    /// Results are strictly newest-first. A following-only query for an
    /// account with no followees returns empty without touching the post
    /// table at all.
    pub async fn query_feed(&self, query: &FeedQuery) -> SnsResult<Vec<PostView>> {
        let author_scope = match (&query.author_id, &query.following_only_for) {
            (Some(author), _) => Some(vec![author.clone()]),
            (None, Some(viewer)) => {
                let ids: Vec<String> =
                    sqlx::query_scalar("SELECT following_id FROM follow WHERE follower_id = ?1")
                        .bind(viewer)
                        .fetch_all(&self.db)
                        .await
                        .map_err(|e| SnsError::Database(e))?;

                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            (None, None) => None,
        };

        let mut sql = String::from(
            "SELECT id, user_id, image_url, title, description, region, url, created_at, edited_at
             FROM post",
        );

        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(ids) = &author_scope {
            let placeholders: Vec<String> = (0..ids.len())
                .map(|i| format!("?{}", binds.len() + i + 1))
                .collect();
            conditions.push(format!("user_id IN ({})", placeholders.join(", ")));
            binds.extend(ids.iter().cloned());
        }

        if let Some(region) = &query.region {
            binds.push(region.clone());
            conditions.push(format!("region = ?{}", binds.len()));
        }

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search.to_lowercase());
            binds.push(pattern.clone());
            let title_param = binds.len();
            binds.push(pattern);
            let description_param = binds.len();
            conditions.push(format!(
                "(LOWER(title) LIKE ?{} OR LOWER(IFNULL(description, '')) LIKE ?{})",
                title_param, description_param
            ));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut db_query = sqlx::query_as::<_, Post>(&sql);
        for bind in &binds {
            db_query = db_query.bind(bind);
        }

        let mut posts = db_query
            .fetch_all(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        // The tag filter intersects after the fact, preserving order
        if let Some(tag) = &query.tag {
            let tagged: Vec<String> = sqlx::query_scalar(
                "SELECT pt.post_id FROM post_tag pt
                 JOIN tag t ON t.id = pt.tag_id
                 WHERE t.name = ?1",
            )
            .bind(tag)
            .fetch_all(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

            let tagged: HashSet<String> = tagged.into_iter().collect();
            posts.retain(|post| tagged.contains(&post.id));
        }

        self.hydrate(posts).await
    }

    /// Attach author profiles and tag names to a page of posts
    async fn hydrate(&self, posts: Vec<Post>) -> SnsResult<Vec<PostView>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        let mut author_ids: Vec<&str> = posts.iter().map(|p| p.user_id.as_str()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let placeholders: Vec<String> =
            (1..=author_ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT id, username, display_name, avatar_url, bio, is_admin, is_verified, created_at
             FROM profile WHERE id IN ({})",
            placeholders.join(", ")
        );
        let mut db_query = sqlx::query_as::<_, Profile>(&sql);
        for id in &author_ids {
            db_query = db_query.bind(*id);
        }
        let profiles = db_query
            .fetch_all(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;
        let authors: HashMap<String, Profile> =
            profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        let placeholders: Vec<String> =
            (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT pt.post_id, t.name FROM post_tag pt
             JOIN tag t ON t.id = pt.tag_id
             WHERE pt.post_id IN ({})
             ORDER BY t.rowid",
            placeholders.join(", ")
        );
        let mut db_query = sqlx::query_as::<_, (String, String)>(&sql);
        for id in &post_ids {
            db_query = db_query.bind(*id);
        }
        let tag_rows = db_query
            .fetch_all(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        let mut tags_by_post: HashMap<String, Vec<String>> = HashMap::new();
        for (post_id, name) in tag_rows {
            tags_by_post.entry(post_id).or_default().push(name);
        }

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            let author = authors
                .get(&post.user_id)
                .cloned()
                .ok_or_else(|| SnsError::Internal("Post author has no profile".to_string()))?;
            let tags = tags_by_post.remove(&post.id).unwrap_or_default();
            views.push(PostView { post, author, tags });
        }

        Ok(views)
    }
}

/// Post manager implementation using runtime queries
use crate::{
    content::{PostInput, PostView},
    db::models::{Post, Profile},
    error::{SnsError, SnsResult},
    validation,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Post manager service
pub struct PostManager {
    db: SqlitePool,
}

impl PostManager {
    /// Create a new post manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a post for an author
    ///
    /// All field validation happens before the first write. The post row and
    /// its tag associations commit together.
    pub async fn create_post(&self, author_id: &str, input: PostInput) -> SnsResult<PostView> {
        let input = normalize_input(input)?;
        let tags = validation::normalize_tag_names(&input.tags);

        let post_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.db.begin().await.map_err(|e| SnsError::Database(e))?;

        sqlx::query(
            "INSERT INTO post (id, user_id, image_url, title, description, region, url, created_at, edited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
        )
        .bind(&post_id)
        .bind(author_id)
        .bind(&input.image_url)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.region)
        .bind(&input.url)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| SnsError::Database(e))?;

        apply_tags(&mut tx, &post_id, &tags).await?;

        tx.commit().await.map_err(|e| SnsError::Database(e))?;

        tracing::info!(post_id = %post_id, author_id = %author_id, "Created post");

        self.load_view(&post_id).await
    }

    /// Edit a post
    ///
    /// Only the author may edit, admins included. The tag association set is
    /// fully replaced and edited_at is stamped on every successful edit.
    pub async fn edit_post(
        &self,
        post_id: &str,
        editor_id: &str,
        input: PostInput,
    ) -> SnsResult<PostView> {
        let author_id = self.author_of(post_id).await?;
        if author_id != editor_id {
            return Err(SnsError::Authorization(
                "Only the author can edit this post".to_string(),
            ));
        }

        let input = normalize_input(input)?;
        let tags = validation::normalize_tag_names(&input.tags);

        let mut tx = self.db.begin().await.map_err(|e| SnsError::Database(e))?;

        sqlx::query(
            "UPDATE post SET image_url = ?1, title = ?2, description = ?3, region = ?4, url = ?5, edited_at = ?6
             WHERE id = ?7",
        )
        .bind(&input.image_url)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.region)
        .bind(&input.url)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| SnsError::Database(e))?;

        sqlx::query("DELETE FROM post_tag WHERE post_id = ?1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| SnsError::Database(e))?;

        apply_tags(&mut tx, post_id, &tags).await?;

        tx.commit().await.map_err(|e| SnsError::Database(e))?;

        tracing::info!(post_id = %post_id, "Edited post");

        self.load_view(post_id).await
    }

    /// Delete a post
    ///
    /// Permitted for the author or any admin. Associations and reactions go
    /// with it through the storage-level cascades.
    pub async fn delete_post(&self, post_id: &str, requester_id: &str) -> SnsResult<()> {
        let author_id = self.author_of(post_id).await?;

        if author_id != requester_id {
            let is_admin: Option<bool> =
                sqlx::query_scalar("SELECT is_admin FROM profile WHERE id = ?1")
                    .bind(requester_id)
                    .fetch_optional(&self.db)
                    .await
                    .map_err(|e| SnsError::Database(e))?;

            if !is_admin.unwrap_or(false) {
                return Err(SnsError::Authorization(
                    "Only the author or an admin can delete this post".to_string(),
                ));
            }
        }

        sqlx::query("DELETE FROM post WHERE id = ?1")
            .bind(post_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        tracing::info!(post_id = %post_id, requester_id = %requester_id, "Deleted post");

        Ok(())
    }

    /// Get a post with its author and tags
    pub async fn get_post(&self, post_id: &str) -> SnsResult<Option<PostView>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, user_id, image_url, title, description, region, url, created_at, edited_at
             FROM post WHERE id = ?1",
        )
        .bind(post_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        match post {
            Some(post) => Ok(Some(self.view_of(post).await?)),
            None => Ok(None),
        }
    }

    /// First 20 tag names in insertion order
    pub async fn popular_tags(&self) -> SnsResult<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM tag ORDER BY rowid LIMIT 20")
                .fetch_all(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        Ok(names)
    }

    async fn author_of(&self, post_id: &str) -> SnsResult<String> {
        sqlx::query_scalar("SELECT user_id FROM post WHERE id = ?1")
            .bind(post_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?
            .ok_or_else(|| SnsError::NotFound("Post not found".to_string()))
    }

    async fn load_view(&self, post_id: &str) -> SnsResult<PostView> {
        self.get_post(post_id)
            .await?
            .ok_or_else(|| SnsError::NotFound("Post not found".to_string()))
    }

    async fn view_of(&self, post: Post) -> SnsResult<PostView> {
        let author = sqlx::query_as::<_, Profile>(
            "SELECT id, username, display_name, avatar_url, bio, is_admin, is_verified, created_at
             FROM profile WHERE id = ?1",
        )
        .bind(&post.user_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT t.name FROM tag t
             JOIN post_tag pt ON pt.tag_id = t.id
             WHERE pt.post_id = ?1
             ORDER BY t.rowid",
        )
        .bind(&post.id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(PostView { post, author, tags })
    }
}

/// Validate and normalize post fields, mapping empty optionals to NULL
fn normalize_input(input: PostInput) -> SnsResult<PostInput> {
    let title = input.title.trim().to_string();
    validation::validate_title(&title)?;

    if input.image_url.trim().is_empty() {
        return Err(SnsError::Validation("Image is required".to_string()));
    }

    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let url = input
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    if let Some(ref url) = url {
        validation::validate_post_url(url)?;
    }

    let region = input
        .region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if let Some(ref region) = region {
        validation::validate_region(region)?;
    }

    Ok(PostInput {
        image_url: input.image_url,
        title,
        description,
        region,
        url,
        tags: input.tags,
    })
}

/// Associate tags with a post, creating missing tag rows on the way
///
/// Get-or-create goes through the tag name UNIQUE constraint so concurrent
/// submissions of the same new name converge on one row.
async fn apply_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post_id: &str,
    names: &[String],
) -> SnsResult<()> {
    for name in names {
        sqlx::query(
            "INSERT INTO tag (id, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| SnsError::Database(e))?;

        let tag_id: String = sqlx::query_scalar("SELECT id FROM tag WHERE name = ?1")
            .bind(name)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| SnsError::Database(e))?;

        sqlx::query("INSERT INTO post_tag (post_id, tag_id) VALUES (?1, ?2)")
            .bind(post_id)
            .bind(&tag_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| SnsError::Database(e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_manager() -> PostManager {
        let db = SqlitePool::connect(":memory:").await.unwrap();

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

        sqlx::query(
            r#"
            CREATE TABLE post (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                image_url TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                region TEXT,
                url TEXT,
                created_at DATETIME NOT NULL,
                edited_at DATETIME
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE tag (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE post_tag (
                post_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                PRIMARY KEY (post_id, tag_id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        PostManager::new(db)
    }

    async fn insert_profile(manager: &PostManager, username: &str, is_admin: bool) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO profile (id, username, display_name, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(username)
        .bind(username)
        .bind(is_admin)
        .bind(Utc::now())
        .execute(&manager.db)
        .await
        .unwrap();
        id
    }

    fn sample_input(title: &str, tags: Vec<&str>) -> PostInput {
        PostInput {
            image_url: "http://localhost:8080/blobs/abc".to_string(),
            title: title.to_string(),
            description: Some("駄菓子屋で見つけた".to_string()),
            region: Some("北海道".to_string()),
            url: Some("https://example.com/snack".to_string()),
            tags: tags.into_iter().map(String::from).collect(),
        }
    }

    async fn count(manager: &PostManager, sql: &str) -> i64 {
        sqlx::query_scalar(sql).fetch_one(&manager.db).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_post_dedupes_tags() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        let view = manager
            .create_post(&alice, sample_input("白い恋人", vec!["チョコ", "チョコ", " ", "抹茶"]))
            .await
            .unwrap();

        assert_eq!(view.post.title, "白い恋人");
        assert_eq!(view.post.region.as_deref(), Some("北海道"));
        assert!(view.post.edited_at.is_none());
        assert_eq!(view.tags, vec!["チョコ", "抹茶"]);
        assert_eq!(view.author.username, "alice");

        assert_eq!(count(&manager, "SELECT COUNT(*) FROM tag").await, 2);
        assert_eq!(count(&manager, "SELECT COUNT(*) FROM post_tag").await, 2);
    }

    #[tokio::test]
    async fn test_second_post_reuses_tag_row() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        manager
            .create_post(&alice, sample_input("ポテト", vec!["チョコ"]))
            .await
            .unwrap();
        manager
            .create_post(&alice, sample_input("キャラメル", vec!["チョコ"]))
            .await
            .unwrap();

        assert_eq!(count(&manager, "SELECT COUNT(*) FROM tag").await, 1);
        assert_eq!(count(&manager, "SELECT COUNT(*) FROM post_tag").await, 2);
    }

    #[tokio::test]
    async fn test_bad_url_writes_nothing() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        let mut input = sample_input("テスト", vec!["a"]);
        input.url = Some("ftp://x".to_string());

        let result = manager.create_post(&alice, input).await;
        assert!(matches!(result, Err(SnsError::Validation(_))));

        assert_eq!(count(&manager, "SELECT COUNT(*) FROM post").await, 0);
        assert_eq!(count(&manager, "SELECT COUNT(*) FROM tag").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_region_rejected() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        let mut input = sample_input("テスト", vec![]);
        input.region = Some("Atlantis".to_string());

        let result = manager.create_post(&alice, input).await;
        assert!(matches!(result, Err(SnsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_replaces_tag_set() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        let view = manager
            .create_post(&alice, sample_input("うまい棒", vec!["駄菓子", "コーン"]))
            .await
            .unwrap();

        let mut edit = sample_input("うまい棒 チーズ味", vec!["駄菓子", "チーズ"]);
        edit.region = None;

        let edited = manager
            .edit_post(&view.post.id, &alice, edit)
            .await
            .unwrap();

        assert_eq!(edited.post.title, "うまい棒 チーズ味");
        assert!(edited.post.region.is_none());
        assert!(edited.post.edited_at.is_some());
        assert_eq!(edited.tags, vec!["駄菓子", "チーズ"]);

        // The old tag rows survive even when orphaned
        assert_eq!(count(&manager, "SELECT COUNT(*) FROM tag").await, 3);
        assert_eq!(count(&manager, "SELECT COUNT(*) FROM post_tag").await, 2);
    }

    #[tokio::test]
    async fn test_edit_by_non_author_forbidden() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;
        let admin = insert_profile(&manager, "admin", true).await;

        let view = manager
            .create_post(&alice, sample_input("ラムネ", vec!["瓶"]))
            .await
            .unwrap();

        // Admins cannot edit either
        let result = manager
            .edit_post(&view.post.id, &admin, sample_input("改変", vec![]))
            .await;
        assert!(matches!(result, Err(SnsError::Authorization(_))));

        let unchanged = manager.get_post(&view.post.id).await.unwrap().unwrap();
        assert_eq!(unchanged.post.title, "ラムネ");
        assert!(unchanged.post.edited_at.is_none());
        assert_eq!(unchanged.tags, vec!["瓶"]);
    }

    #[tokio::test]
    async fn test_delete_author_and_admin_allowed() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;
        let bob = insert_profile(&manager, "bob", false).await;
        let admin = insert_profile(&manager, "admin", true).await;

        let first = manager
            .create_post(&alice, sample_input("ひとつめ", vec![]))
            .await
            .unwrap();
        let second = manager
            .create_post(&alice, sample_input("ふたつめ", vec![]))
            .await
            .unwrap();

        // Unrelated account cannot delete
        let result = manager.delete_post(&first.post.id, &bob).await;
        assert!(matches!(result, Err(SnsError::Authorization(_))));

        manager.delete_post(&first.post.id, &alice).await.unwrap();
        manager.delete_post(&second.post.id, &admin).await.unwrap();

        assert_eq!(count(&manager, "SELECT COUNT(*) FROM post").await, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_post_not_found() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        let result = manager.delete_post("missing", &alice).await;
        assert!(matches!(result, Err(SnsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_post_is_none() {
        let manager = create_test_manager().await;
        assert!(manager.get_post("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_popular_tags_insertion_order() {
        let manager = create_test_manager().await;
        let alice = insert_profile(&manager, "alice", false).await;

        manager
            .create_post(&alice, sample_input("一", vec!["先", "次"]))
            .await
            .unwrap();
        manager
            .create_post(&alice, sample_input("二", vec!["後", "先"]))
            .await
            .unwrap();

        let tags = manager.popular_tags().await.unwrap();
        assert_eq!(tags, vec!["先", "次", "後"]);
    }
}

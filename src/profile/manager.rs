/// Profile manager implementation using runtime queries
use crate::{
    db::models::Profile,
    error::{is_unique_violation, SnsError, SnsResult},
    profile::ProfileView,
    validation,
};
use chrono::Utc;
use sqlx::SqlitePool;

/// Profile manager service
pub struct ProfileManager {
    db: SqlitePool,
}

impl ProfileManager {
    /// Create a new profile manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create the profile for an account
    ///
    /// Username uniqueness is enforced by the storage layer; the advisory
    /// availability probe never gates this insert. A race that slips past the
    /// probe surfaces here as a Conflict.
    pub async fn create_profile(
        &self,
        account_id: &str,
        username: &str,
        display_name: &str,
        avatar_url: Option<String>,
    ) -> SnsResult<Profile> {
        validation::validate_username(username)?;
        validation::validate_display_name(display_name)?;

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO profile (id, username, display_name, avatar_url, bio, is_admin, is_verified, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7)",
        )
        .bind(account_id)
        .bind(username)
        .bind(display_name)
        .bind(&avatar_url)
        .bind(false)
        .bind(false)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                let detail = e
                    .as_database_error()
                    .map(|d| d.message().to_string())
                    .unwrap_or_default();
                if detail.contains("profile.username") {
                    SnsError::Conflict("Username already taken".to_string())
                } else {
                    SnsError::Conflict("Profile already exists for this account".to_string())
                }
            } else {
                SnsError::Database(e)
            }
        })?;

        tracing::info!(account_id = %account_id, username = %username, "Created profile");

        Ok(Profile {
            id: account_id.to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            avatar_url,
            bio: None,
            is_admin: false,
            is_verified: false,
            created_at: now,
        })
    }

    /// Advisory username availability probe
    ///
    /// True iff no profile currently carries the name. UX-only; creation can
    /// still lose the race and must handle the Conflict.
    pub async fn username_available(&self, username: &str) -> SnsResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profile WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        Ok(count == 0)
    }

    /// Get a profile by account id
    pub async fn get_profile(&self, account_id: &str) -> SnsResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, username, display_name, avatar_url, bio, is_admin, is_verified, created_at
             FROM profile WHERE id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(profile)
    }

    /// Get a profile with its aggregate counts
    pub async fn get_profile_view(&self, account_id: &str) -> SnsResult<Option<ProfileView>> {
        let profile = match self.get_profile(account_id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let post_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post WHERE user_id = ?1")
            .bind(account_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        let follower_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow WHERE following_id = ?1")
                .bind(account_id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        let following_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow WHERE follower_id = ?1")
                .bind(account_id)
                .fetch_one(&self.db)
                .await
                .map_err(|e| SnsError::Database(e))?;

        Ok(Some(ProfileView {
            profile,
            post_count,
            follower_count,
            following_count,
        }))
    }

    /// Update the owner's bio
    pub async fn update_bio(&self, account_id: &str, bio: &str) -> SnsResult<Profile> {
        validation::validate_bio(bio)?;

        let result = sqlx::query("UPDATE profile SET bio = ?1 WHERE id = ?2")
            .bind(bio)
            .bind(account_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        if result.rows_affected() == 0 {
            return Err(SnsError::NotFound("Profile not found".to_string()));
        }

        self.get_profile(account_id)
            .await?
            .ok_or_else(|| SnsError::NotFound("Profile not found".to_string()))
    }

    /// Update the owner's avatar URL
    pub async fn update_avatar(&self, account_id: &str, avatar_url: &str) -> SnsResult<Profile> {
        let result = sqlx::query("UPDATE profile SET avatar_url = ?1 WHERE id = ?2")
            .bind(avatar_url)
            .bind(account_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        if result.rows_affected() == 0 {
            return Err(SnsError::NotFound("Profile not found".to_string()));
        }

        self.get_profile(account_id)
            .await?
            .ok_or_else(|| SnsError::NotFound("Profile not found".to_string()))
    }

    /// Set or clear the admin flag (startup bootstrap only)
    pub async fn set_admin(&self, account_id: &str, is_admin: bool) -> SnsResult<()> {
        let result = sqlx::query("UPDATE profile SET is_admin = ?1 WHERE id = ?2")
            .bind(is_admin)
            .bind(account_id)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        if result.rows_affected() == 0 {
            return Err(SnsError::NotFound("Profile not found".to_string()));
        }

        tracing::info!(account_id = %account_id, is_admin, "Updated admin flag");

        Ok(())
    }
}

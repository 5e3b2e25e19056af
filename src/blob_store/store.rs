/// Blob store
///
/// Coordinates the storage backend with database metadata. Storage is
/// content-addressed: the CID is the hex SHA-256 of the bytes, so the same
/// image uploaded twice lands on one file.
use crate::{
    blob_store::{disk::DiskBlobBackend, BlobBackend, StoredBlob},
    error::{SnsError, SnsResult},
};
use chrono::{Duration, Utc};
use image::{imageops::FilterType, ImageFormat};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

/// Avatars are normalized to this square edge length
const AVATAR_SIZE: u32 = 400;

const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Main blob store manager
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn BlobBackend>,
    db: SqlitePool,
    max_blob_size: usize,
}

impl BlobStore {
    /// Create a new blob store over a disk backend
    pub fn new(blob_directory: PathBuf, max_blob_size: usize, db: SqlitePool) -> Self {
        let backend: Arc<dyn BlobBackend> = Arc::new(DiskBlobBackend::new(blob_directory));
        Self {
            backend,
            db,
            max_blob_size,
        }
    }

    /// Store an uploaded image
    ///
    /// The MIME type is taken from the caller when given, otherwise sniffed
    /// from the bytes. Only the image allow-list is accepted.
    pub async fn upload(&self, data: Vec<u8>, mime_type: Option<&str>) -> SnsResult<StoredBlob> {
        let size = data.len();
        if size > self.max_blob_size {
            return Err(SnsError::Validation(format!(
                "Blob size {} exceeds maximum {}",
                size, self.max_blob_size
            )));
        }
        if size == 0 {
            return Err(SnsError::Validation("Blob is empty".to_string()));
        }

        let mime_type = match mime_type {
            Some(mime) => mime.to_string(),
            None => image::guess_format(&data)
                .map(|format| format.to_mime_type().to_string())
                .unwrap_or_else(|_| "application/octet-stream".to_string()),
        };

        if !ALLOWED_TYPES.contains(&mime_type.as_str()) {
            return Err(SnsError::Validation(format!(
                "Unsupported MIME type: {}",
                mime_type
            )));
        }

        let cid = Self::calculate_cid(&data);

        // Content-addressed: a second upload of the same bytes is a no-op
        if self.backend.exists(&cid).await? {
            return Ok(StoredBlob {
                cid,
                mime_type,
                size: size as i64,
            });
        }

        self.backend.put(&cid, data).await?;

        sqlx::query(
            "INSERT INTO blob (cid, mime_type, size, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cid) DO NOTHING",
        )
        .bind(&cid)
        .bind(&mime_type)
        .bind(size as i64)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        tracing::info!(cid = %cid, mime_type = %mime_type, size, "Stored blob");

        Ok(StoredBlob {
            cid,
            mime_type,
            size: size as i64,
        })
    }

    /// Store an avatar image, normalized to a 400x400 JPEG
    pub async fn upload_avatar(&self, data: Vec<u8>) -> SnsResult<StoredBlob> {
        if data.len() > self.max_blob_size {
            return Err(SnsError::Validation(format!(
                "Blob size {} exceeds maximum {}",
                data.len(),
                self.max_blob_size
            )));
        }

        let processed = Self::process_avatar(&data)?;
        self.upload(processed, Some("image/jpeg")).await
    }

    /// Center-crop to a square and resize to the avatar edge length
    fn process_avatar(data: &[u8]) -> SnsResult<Vec<u8>> {
        let img = image::load_from_memory(data)
            .map_err(|e| SnsError::Validation(format!("Invalid image data: {}", e)))?;

        let (width, height) = (img.width(), img.height());
        let side = width.min(height);
        let x = (width - side) / 2;
        let y = (height - side) / 2;

        let square = img
            .crop_imm(x, y, side, side)
            .resize_exact(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);

        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        square
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)
            .map_err(|e| SnsError::BlobStorage(format!("Failed to encode avatar: {}", e)))?;

        Ok(buf)
    }

    /// Get a blob by CID, with its stored MIME type
    pub async fn get(&self, cid: &str) -> SnsResult<Option<(Vec<u8>, String)>> {
        let data = self.backend.get(cid).await?;

        if let Some(data) = data {
            let mime_type: Option<String> =
                sqlx::query_scalar("SELECT mime_type FROM blob WHERE cid = ?1")
                    .bind(cid)
                    .fetch_optional(&self.db)
                    .await
                    .map_err(|e| SnsError::Database(e))?;

            Ok(Some((
                data,
                mime_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            )))
        } else {
            Ok(None)
        }
    }

    /// Delete a blob and its metadata
    pub async fn delete(&self, cid: &str) -> SnsResult<()> {
        self.backend.delete(cid).await?;

        sqlx::query("DELETE FROM blob WHERE cid = ?1")
            .bind(cid)
            .execute(&self.db)
            .await
            .map_err(|e| SnsError::Database(e))?;

        Ok(())
    }

    /// CIDs old enough to reap that no post image or profile avatar references
    ///
    /// The age cutoff keeps a freshly uploaded blob safe during the window
    /// between upload and the record mutation that will reference it.
    pub async fn list_orphaned(&self, older_than: Duration) -> SnsResult<Vec<String>> {
        let cutoff = Utc::now() - older_than;

        let cids: Vec<String> = sqlx::query_scalar(
            "SELECT cid FROM blob
             WHERE created_at < ?1
               AND NOT EXISTS (SELECT 1 FROM post WHERE post.image_url LIKE '%' || blob.cid)
               AND NOT EXISTS (SELECT 1 FROM profile WHERE profile.avatar_url LIKE '%' || blob.cid)
             ORDER BY created_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.db)
        .await
        .map_err(|e| SnsError::Database(e))?;

        Ok(cids)
    }

    /// Calculate the CID for data: hex-encoded SHA-256
    fn calculate_cid(data: &[u8]) -> String {
        let hash = Sha256::digest(data);
        hex::encode(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn create_test_store() -> BlobStore {
        let dir = tempdir().unwrap();

        let db = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE blob (
                cid TEXT PRIMARY KEY,
                mime_type TEXT NOT NULL,
                size INTEGER NOT NULL,
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
                created_at DATETIME NOT NULL
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
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        BlobStore::new(dir.path().to_path_buf(), 1024 * 1024, db)
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_upload_and_get_blob() {
        let store = create_test_store().await;

        let data = png_bytes(10, 10);
        let blob = store.upload(data.clone(), Some("image/png")).await.unwrap();

        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.size, data.len() as i64);

        let (retrieved, mime_type) = store.get(&blob.cid).await.unwrap().unwrap();
        assert_eq!(retrieved, data);
        assert_eq!(mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_duplicate_upload_shares_cid() {
        let store = create_test_store().await;

        let data = png_bytes(10, 10);
        let first = store.upload(data.clone(), Some("image/png")).await.unwrap();
        let second = store.upload(data, Some("image/png")).await.unwrap();

        assert_eq!(first.cid, second.cid);
    }

    #[tokio::test]
    async fn test_mime_type_sniffed_when_missing() {
        let store = create_test_store().await;

        let blob = store.upload(png_bytes(4, 4), None).await.unwrap();
        assert_eq!(blob.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_oversized_blob_rejected() {
        let store = create_test_store().await;

        let large = vec![0u8; 2 * 1024 * 1024];
        let result = store.upload(large, Some("image/png")).await;
        assert!(matches!(result, Err(SnsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_disallowed_mime_type_rejected() {
        let store = create_test_store().await;

        let result = store.upload(b"plain".to_vec(), Some("text/plain")).await;
        assert!(matches!(result, Err(SnsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_avatar_normalized_to_square_jpeg() {
        let store = create_test_store().await;

        // A wide source image
        let blob = store.upload_avatar(png_bytes(800, 200)).await.unwrap();
        assert_eq!(blob.mime_type, "image/jpeg");

        let (data, _) = store.get(&blob.cid).await.unwrap().unwrap();
        let img = image::load_from_memory(&data).unwrap();
        assert_eq!(img.width(), AVATAR_SIZE);
        assert_eq!(img.height(), AVATAR_SIZE);
    }

    #[tokio::test]
    async fn test_avatar_rejects_garbage() {
        let store = create_test_store().await;

        let result = store.upload_avatar(b"not an image".to_vec()).await;
        assert!(matches!(result, Err(SnsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_blob() {
        let store = create_test_store().await;

        let blob = store.upload(png_bytes(10, 10), Some("image/png")).await.unwrap();
        store.delete(&blob.cid).await.unwrap();

        assert!(store.get(&blob.cid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orphaned_spares_referenced_blobs() {
        let store = create_test_store().await;

        let referenced = store.upload(png_bytes(10, 10), Some("image/png")).await.unwrap();
        let orphan = store.upload(png_bytes(20, 20), Some("image/png")).await.unwrap();
        let fresh = store.upload(png_bytes(30, 30), Some("image/png")).await.unwrap();

        // Age the first two past the cutoff
        for cid in [&referenced.cid, &orphan.cid] {
            sqlx::query("UPDATE blob SET created_at = ?1 WHERE cid = ?2")
                .bind(Utc::now() - Duration::days(2))
                .bind(cid)
                .execute(&store.db)
                .await
                .unwrap();
        }

        // A post references the first blob by URL
        sqlx::query(
            "INSERT INTO post (id, user_id, image_url, title, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind("post-1")
        .bind("alice")
        .bind(format!("http://localhost:8080/blobs/{}", referenced.cid))
        .bind("タイトル")
        .bind(Utc::now())
        .execute(&store.db)
        .await
        .unwrap();

        let orphans = store.list_orphaned(Duration::hours(24)).await.unwrap();
        assert_eq!(orphans, vec![orphan.cid.clone()]);

        // The fresh upload stays inside the grace window
        assert!(!orphans.contains(&fresh.cid));
    }
}

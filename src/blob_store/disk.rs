/// Disk-based blob storage backend
use crate::{
    blob_store::BlobBackend,
    error::{SnsError, SnsResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores blobs on the local filesystem with directory sharding
/// based on CID prefixes to prevent too many files in one directory.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the file path for a CID
    ///
    /// Uses directory sharding: {base}/{first2chars}/{cid}
    /// For example, CID "9f86d08188..." -> {base}/9f/9f86d08188...
    fn blob_path(&self, cid: &str) -> PathBuf {
        if cid.len() >= 2 {
            let shard = &cid[0..2];
            self.base_path.join(shard).join(cid)
        } else {
            self.base_path.join("_").join(cid)
        }
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, cid: &str) -> SnsResult<PathBuf> {
        let blob_path = self.blob_path(cid);
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SnsError::BlobStorage(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, cid: &str, data: Vec<u8>) -> SnsResult<()> {
        let blob_path = self.ensure_blob_dir(cid).await?;

        fs::write(&blob_path, data)
            .await
            .map_err(|e| SnsError::BlobStorage(format!("Failed to write blob {}: {}", cid, e)))?;

        Ok(())
    }

    async fn get(&self, cid: &str) -> SnsResult<Option<Vec<u8>>> {
        let blob_path = self.blob_path(cid);

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnsError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                cid, e
            ))),
        }
    }

    async fn delete(&self, cid: &str) -> SnsResult<()> {
        let blob_path = self.blob_path(cid);

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnsError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                cid, e
            ))),
        }
    }

    async fn exists(&self, cid: &str) -> SnsResult<bool> {
        let blob_path = self.blob_path(cid);
        Ok(blob_path.exists())
    }
}

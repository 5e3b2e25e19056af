/// Blob storage
///
/// Content-addressed storage for uploaded images. Post photos are stored as
/// received; avatars are normalized to a square JPEG first.

pub mod disk;
pub mod models;
pub mod store;

pub use models::*;
pub use store::BlobStore;

use crate::error::SnsResult;
use async_trait::async_trait;

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob bytes;
/// metadata lives in the database alongside the domain tables.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob under its CID
    async fn put(&self, cid: &str, data: Vec<u8>) -> SnsResult<()>;

    /// Retrieve a blob by CID
    async fn get(&self, cid: &str) -> SnsResult<Option<Vec<u8>>>;

    /// Delete a blob by CID
    async fn delete(&self, cid: &str) -> SnsResult<()>;

    /// Check if a blob exists
    async fn exists(&self, cid: &str) -> SnsResult<bool>;
}

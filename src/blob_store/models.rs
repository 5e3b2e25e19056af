/// Blob storage data models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Result of a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBlob {
    pub cid: String,
    pub mime_type: String,
    pub size: i64,
}

/// Blob metadata row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BlobRecord {
    pub cid: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

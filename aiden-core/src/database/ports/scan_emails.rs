use aiden_model::{ScanEmailId, ScanId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Stored scan email; `content` is ciphertext of the JSON email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEmailRecord {
    pub id: ScanEmailId,
    pub scan_id: ScanId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ScanEmailsRepository: Send + Sync {
    async fn insert_scan_email(
        &self,
        scan_id: ScanId,
        content: &str,
    ) -> Result<ScanEmailRecord>;

    async fn latest_for_scan(
        &self,
        scan_id: ScanId,
    ) -> Result<Option<ScanEmailRecord>>;
}

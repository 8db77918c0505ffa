use aiden_model::{Finding, ScanId, ScanRequest, ScanStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Finding ready for persistence. `data` is already ciphertext.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFinding {
    pub module: String,
    pub kind: String,
    pub data: String,
    pub date_found: Option<DateTime<Utc>>,
    pub corroboration: u32,
    pub score: f64,
}

#[async_trait]
pub trait ScansRepository: Send + Sync {
    /// Insert a request in `pending`.
    async fn create_scan(&self, email: &str, consent: bool)
    -> Result<ScanRequest>;

    async fn get_scan(&self, id: ScanId) -> Result<Option<ScanRequest>>;

    /// Scans still `pending` or `running`, oldest first.
    async fn list_unfinished(&self) -> Result<Vec<ScanRequest>>;

    /// Conditional `pending -> running`. Returns `false` when the scan was not
    /// pending (already claimed, finished or failed).
    async fn claim_pending(&self, id: ScanId) -> Result<bool>;

    /// Store every finding and move `running -> finished` atomically.
    /// Fails with `InvalidTransition` if the scan is not running.
    async fn complete_with_findings(
        &self,
        id: ScanId,
        findings: &[NewFinding],
    ) -> Result<usize>;

    /// Move `from -> error` recording `reason`. Fails with
    /// `InvalidTransition` if the edge is illegal or the scan is not in
    /// `from`.
    async fn mark_failed(
        &self,
        id: ScanId,
        from: ScanStatus,
        reason: &str,
    ) -> Result<()>;

    /// Stored findings (ciphertext) in descending score order, ties by id.
    async fn list_findings(
        &self,
        id: ScanId,
        limit: Option<usize>,
    ) -> Result<Vec<Finding>>;
}

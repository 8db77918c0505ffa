use std::fmt;

use aiden_model::ScanId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a queued job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work item: run the collector for one scan request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanJob {
    pub id: JobId,
    pub scan_id: ScanId,
    pub enqueued_at: DateTime<Utc>,
}

impl ScanJob {
    pub fn new(scan_id: ScanId) -> Self {
        Self {
            id: JobId::new(),
            scan_id,
            enqueued_at: Utc::now(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ScanEmailId, ScanId};

/// Simulated phishing email produced by the content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhishingEmail {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A phishing email generated from a finished scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEmail {
    pub id: ScanEmailId,
    pub scan_id: ScanId,
    pub email: PhishingEmail,
    pub created_at: DateTime<Utc>,
}

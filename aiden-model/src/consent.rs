use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ConsentId;

/// Immutable audit record of a subject agreeing to be scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consent {
    pub id: ConsentId,
    pub name: String,
    pub email: String,
    pub target: String,
    pub agreed_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub meta: Option<Value>,
}

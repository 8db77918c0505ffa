use aiden_model::Consent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct NewConsent {
    pub name: String,
    pub email: String,
    pub target: String,
    pub agreed_at: DateTime<Utc>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub meta: Option<Value>,
}

/// Append-only: consent entries are never updated or deleted.
#[async_trait]
pub trait ConsentsRepository: Send + Sync {
    async fn insert_consent(&self, consent: &NewConsent) -> Result<Consent>;
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    email::PhishingEmail,
    error::ModelError,
    ids::{EmployeeId, OrganisationId},
};

/// State of an employee's cached OSINT data.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OsintStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl OsintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsintStatus::Pending => "pending",
            OsintStatus::Completed => "completed",
            OsintStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OsintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsintStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OsintStatus::Pending),
            "completed" => Ok(OsintStatus::Completed),
            "failed" => Ok(OsintStatus::Failed),
            other => Err(ModelError::UnknownVariant {
                kind: "osint status",
                value: other.to_string(),
            }),
        }
    }
}

/// An employee enrolled in awareness simulations.
///
/// The OSINT blobs and the phishing email are held here in plaintext; the
/// storage layer encrypts them before they reach the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub organisation_id: OrganisationId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub osint_raw: Option<Value>,
    pub osint_ranked: Option<Value>,
    pub osint_status: OsintStatus,
    pub osint_last_run: Option<DateTime<Utc>>,
    pub phishing_email: Option<PhishingEmail>,
    pub phishing_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

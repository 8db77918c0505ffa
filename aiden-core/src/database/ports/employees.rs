use aiden_model::{EmployeeId, OrganisationId, OsintStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub organisation_id: OrganisationId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
}

/// Employee row as stored; the `*_enc` columns hold ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub organisation_id: OrganisationId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub osint_raw_enc: Option<String>,
    pub osint_ranked_enc: Option<String>,
    pub osint_status: OsintStatus,
    pub osint_last_run: Option<DateTime<Utc>>,
    pub phishing_email_enc: Option<String>,
    pub phishing_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Overwrites the OSINT cache columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsintUpdate {
    pub raw_enc: Option<String>,
    pub ranked_enc: Option<String>,
    pub status: OsintStatus,
    pub last_run: DateTime<Utc>,
}

#[async_trait]
pub trait EmployeesRepository: Send + Sync {
    /// Insert all rows in one transaction; nothing is written on failure.
    async fn insert_many(&self, rows: &[NewEmployee]) -> Result<u64>;

    /// Subset of `emails` already present in the organisation.
    async fn existing_emails(
        &self,
        organisation_id: OrganisationId,
        emails: &[String],
    ) -> Result<Vec<String>>;

    async fn list_by_organisation(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<EmployeeRecord>>;

    async fn get_employee(
        &self,
        id: EmployeeId,
    ) -> Result<Option<EmployeeRecord>>;

    /// Returns `false` when no row matched.
    async fn delete_employee(&self, id: EmployeeId) -> Result<bool>;

    async fn update_osint(
        &self,
        id: EmployeeId,
        update: &OsintUpdate,
    ) -> Result<()>;

    async fn store_phishing_email(
        &self,
        id: EmployeeId,
        content_enc: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()>;
}

//! In-process implementation of every repository port, used by tests and
//! local runs without PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use aiden_model::{
    Consent, ConsentId, EmployeeId, Finding, FindingId, Organisation,
    OrganisationId, OrganisationSettings, OsintStatus, ScanEmailId, ScanId,
    ScanRequest, ScanStatus, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::ports::{
    ConsentsRepository, EmployeeRecord, EmployeesRepository, NewConsent,
    NewEmployee, NewFinding, NewOrganisation, NewUser, OrganisationUpdate,
    OrganisationsRepository, OsintUpdate, ScanEmailRecord,
    ScanEmailsRepository, ScansRepository, SettingsUpdate, UsersRepository,
};
use crate::error::{AidenError, Result};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    scans: HashMap<ScanId, ScanRequest>,
    findings: Vec<Finding>,
    scan_emails: Vec<ScanEmailRecord>,
    employees: HashMap<EmployeeId, EmployeeRecord>,
    organisations: HashMap<OrganisationId, Organisation>,
    settings: HashMap<OrganisationId, OrganisationSettings>,
    users: HashMap<UserId, (User, String)>,
    tokens: HashMap<String, (UserId, DateTime<Utc>)>,
    consents: Vec<Consent>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make finding and OSINT writes fail, simulating a storage outage.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AidenError::Database("simulated write failure".into()));
        }
        Ok(())
    }

    /// Raw stored findings, ciphertext included.
    pub async fn stored_findings(&self, scan_id: ScanId) -> Vec<Finding> {
        let tables = self.tables.lock().await;
        tables
            .findings
            .iter()
            .filter(|f| f.scan_id == scan_id)
            .cloned()
            .collect()
    }

    /// Overwrite a stored finding payload.
    pub async fn corrupt_finding(&self, id: FindingId, data: &str) {
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.findings.iter_mut().find(|f| f.id == id) {
            row.data = data.to_string();
        }
    }

    pub async fn employee_count(&self) -> usize {
        self.tables.lock().await.employees.len()
    }

    /// Every scan requested for `email`, oldest first.
    pub async fn scans_for(&self, email: &str) -> Vec<ScanRequest> {
        let tables = self.tables.lock().await;
        let mut scans: Vec<ScanRequest> = tables
            .scans
            .values()
            .filter(|scan| scan.email == email)
            .cloned()
            .collect();
        scans.sort_by_key(|scan| scan.id);
        scans
    }

    /// Force a scan into `status`, bypassing the transition rules.
    pub async fn set_scan_status(&self, id: ScanId, status: ScanStatus) {
        let mut tables = self.tables.lock().await;
        if let Some(scan) = tables.scans.get_mut(&id) {
            scan.status = status;
        }
    }

    pub async fn consents(&self) -> Vec<Consent> {
        self.tables.lock().await.consents.clone()
    }

    /// Backdate an employee's last OSINT run.
    pub async fn set_osint_last_run(&self, id: EmployeeId, at: DateTime<Utc>) {
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.employees.get_mut(&id) {
            row.osint_last_run = Some(at);
        }
    }
}

fn transition_error(from: ScanStatus, to: ScanStatus) -> AidenError {
    AidenError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[async_trait]
impl ScansRepository for InMemoryStore {
    async fn create_scan(
        &self,
        email: &str,
        consent: bool,
    ) -> Result<ScanRequest> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let scan = ScanRequest {
            id: ScanId(tables.next_id()),
            email: email.to_string(),
            consent,
            status: ScanStatus::Pending,
            failure_reason: None,
            requested_at: now,
            updated_at: now,
        };
        tables.scans.insert(scan.id, scan.clone());
        Ok(scan)
    }

    async fn get_scan(&self, id: ScanId) -> Result<Option<ScanRequest>> {
        Ok(self.tables.lock().await.scans.get(&id).cloned())
    }

    async fn list_unfinished(&self) -> Result<Vec<ScanRequest>> {
        let tables = self.tables.lock().await;
        let mut scans: Vec<ScanRequest> = tables
            .scans
            .values()
            .filter(|scan| !scan.status.is_terminal())
            .cloned()
            .collect();
        scans.sort_by_key(|scan| scan.id);
        Ok(scans)
    }

    async fn claim_pending(&self, id: ScanId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.scans.get_mut(&id) {
            Some(scan) if scan.status == ScanStatus::Pending => {
                scan.status = ScanStatus::Running;
                scan.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_with_findings(
        &self,
        id: ScanId,
        findings: &[NewFinding],
    ) -> Result<usize> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let status = tables
            .scans
            .get(&id)
            .map(|scan| scan.status)
            .ok_or_else(|| AidenError::NotFound(format!("scan {id}")))?;
        if status != ScanStatus::Running {
            return Err(transition_error(status, ScanStatus::Finished));
        }

        for finding in findings {
            let row = Finding {
                id: FindingId(tables.next_id()),
                scan_id: id,
                module: finding.module.clone(),
                kind: finding.kind.clone(),
                data: finding.data.clone(),
                date_found: finding.date_found,
                corroboration: finding.corroboration,
                score: finding.score,
            };
            tables.findings.push(row);
        }
        if let Some(scan) = tables.scans.get_mut(&id) {
            scan.status = ScanStatus::Finished;
            scan.updated_at = Utc::now();
        }
        Ok(findings.len())
    }

    async fn mark_failed(
        &self,
        id: ScanId,
        from: ScanStatus,
        reason: &str,
    ) -> Result<()> {
        from.transition(ScanStatus::Error)?;
        let mut tables = self.tables.lock().await;
        let scan = tables
            .scans
            .get_mut(&id)
            .ok_or_else(|| AidenError::NotFound(format!("scan {id}")))?;
        if scan.status != from {
            return Err(transition_error(scan.status, ScanStatus::Error));
        }
        scan.status = ScanStatus::Error;
        scan.failure_reason = Some(reason.to_string());
        scan.updated_at = Utc::now();
        Ok(())
    }

    async fn list_findings(
        &self,
        id: ScanId,
        limit: Option<usize>,
    ) -> Result<Vec<Finding>> {
        let mut rows = self.stored_findings(id).await;
        rows.sort_by(Finding::rank_order);
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ScanEmailsRepository for InMemoryStore {
    async fn insert_scan_email(
        &self,
        scan_id: ScanId,
        content: &str,
    ) -> Result<ScanEmailRecord> {
        let mut tables = self.tables.lock().await;
        if !tables.scans.contains_key(&scan_id) {
            return Err(AidenError::NotFound(format!("scan {scan_id}")));
        }
        let record = ScanEmailRecord {
            id: ScanEmailId(tables.next_id()),
            scan_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        tables.scan_emails.push(record.clone());
        Ok(record)
    }

    async fn latest_for_scan(
        &self,
        scan_id: ScanId,
    ) -> Result<Option<ScanEmailRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .scan_emails
            .iter()
            .filter(|r| r.scan_id == scan_id)
            .max_by_key(|r| r.id)
            .cloned())
    }
}

#[async_trait]
impl EmployeesRepository for InMemoryStore {
    async fn insert_many(&self, rows: &[NewEmployee]) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let clash = rows.iter().find(|row| {
            tables.employees.values().any(|existing| {
                existing.organisation_id == row.organisation_id
                    && existing.email == row.email
            })
        });
        if let Some(row) = clash {
            return Err(AidenError::ExistingEmails(vec![row.email.clone()]));
        }

        let now = Utc::now();
        for row in rows {
            let id = EmployeeId(tables.next_id());
            tables.employees.insert(
                id,
                EmployeeRecord {
                    id,
                    organisation_id: row.organisation_id,
                    first_name: row.first_name.clone(),
                    last_name: row.last_name.clone(),
                    email: row.email.clone(),
                    job_title: row.job_title.clone(),
                    department: row.department.clone(),
                    osint_raw_enc: None,
                    osint_ranked_enc: None,
                    osint_status: OsintStatus::Pending,
                    osint_last_run: None,
                    phishing_email_enc: None,
                    phishing_generated_at: None,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Ok(rows.len() as u64)
    }

    async fn existing_emails(
        &self,
        organisation_id: OrganisationId,
        emails: &[String],
    ) -> Result<Vec<String>> {
        let tables = self.tables.lock().await;
        let mut found: Vec<String> = tables
            .employees
            .values()
            .filter(|e| {
                e.organisation_id == organisation_id
                    && emails.contains(&e.email)
            })
            .map(|e| e.email.clone())
            .collect();
        found.sort();
        Ok(found)
    }

    async fn list_by_organisation(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<EmployeeRecord>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<EmployeeRecord> = tables
            .employees
            .values()
            .filter(|e| e.organisation_id == organisation_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }

    async fn get_employee(
        &self,
        id: EmployeeId,
    ) -> Result<Option<EmployeeRecord>> {
        Ok(self.tables.lock().await.employees.get(&id).cloned())
    }

    async fn delete_employee(&self, id: EmployeeId) -> Result<bool> {
        Ok(self.tables.lock().await.employees.remove(&id).is_some())
    }

    async fn update_osint(
        &self,
        id: EmployeeId,
        update: &OsintUpdate,
    ) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().await;
        let row = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| AidenError::NotFound(format!("employee {id}")))?;
        row.osint_raw_enc = update.raw_enc.clone();
        row.osint_ranked_enc = update.ranked_enc.clone();
        row.osint_status = update.status;
        row.osint_last_run = Some(update.last_run);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn store_phishing_email(
        &self,
        id: EmployeeId,
        content_enc: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .employees
            .get_mut(&id)
            .ok_or_else(|| AidenError::NotFound(format!("employee {id}")))?;
        row.phishing_email_enc = Some(content_enc.to_string());
        row.phishing_generated_at = Some(generated_at);
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl OrganisationsRepository for InMemoryStore {
    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> Result<Organisation> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let row = Organisation {
            id: OrganisationId(tables.next_id()),
            name: organisation.name.clone(),
            website: organisation.website.clone(),
            industry: organisation.industry.clone(),
            size: organisation.size.clone(),
            logo_path: None,
            created_at: now,
            updated_at: now,
        };
        tables.organisations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_organisation(
        &self,
        id: OrganisationId,
    ) -> Result<Option<Organisation>> {
        Ok(self.tables.lock().await.organisations.get(&id).cloned())
    }

    async fn update_organisation(
        &self,
        id: OrganisationId,
        update: &OrganisationUpdate,
    ) -> Result<Option<Organisation>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.organisations.get_mut(&id).map(|row| {
            row.name = update.name.clone();
            row.website = update.website.clone();
            row.industry = update.industry.clone();
            row.size = update.size.clone();
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn get_settings(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Option<OrganisationSettings>> {
        Ok(self
            .tables
            .lock()
            .await
            .settings
            .get(&organisation_id)
            .cloned())
    }

    async fn upsert_settings(
        &self,
        organisation_id: OrganisationId,
        settings: &SettingsUpdate,
    ) -> Result<OrganisationSettings> {
        let mut tables = self.tables.lock().await;
        if !tables.organisations.contains_key(&organisation_id) {
            return Err(AidenError::NotFound(format!(
                "organisation {organisation_id}"
            )));
        }
        let row = OrganisationSettings {
            organisation_id,
            frequency: settings.frequency,
            timezone: settings.timezone.clone(),
            start_at: settings.start_at,
            updated_at: Utc::now(),
        };
        tables.settings.insert(organisation_id, row.clone());
        Ok(row)
    }
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|(u, _)| u.email == user.email) {
            return Err(AidenError::Conflict(
                "email is already registered".into(),
            ));
        }
        let row = User {
            id: UserId(tables.next_id()),
            organisation_id: user.organisation_id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(row.id, (row.clone(), user.password_hash.clone()));
        Ok(row)
    }

    async fn organisation_has_admin(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .any(|(u, _)| u.organisation_id == organisation_id))
    }

    async fn email_taken(&self, email: &str) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|(u, _)| u.email == email))
    }

    async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|(u, _)| u.email == email)
            .cloned())
    }

    async fn store_token(
        &self,
        user: &User,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .tokens
            .insert(token_hash.to_string(), (user.id, expires_at));
        Ok(())
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tokens
            .get(token_hash)
            .filter(|(_, expires_at)| *expires_at > now)
            .and_then(|(user_id, _)| tables.users.get(user_id))
            .map(|(user, _)| user.clone()))
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<()> {
        self.tables.lock().await.tokens.remove(token_hash);
        Ok(())
    }
}

#[async_trait]
impl ConsentsRepository for InMemoryStore {
    async fn insert_consent(&self, consent: &NewConsent) -> Result<Consent> {
        let mut tables = self.tables.lock().await;
        let row = Consent {
            id: ConsentId(tables.next_id()),
            name: consent.name.clone(),
            email: consent.email.clone(),
            target: consent.target.clone(),
            agreed_at: consent.agreed_at,
            ip: consent.ip.clone(),
            user_agent: consent.user_agent.clone(),
            meta: consent.meta.clone(),
        };
        tables.consents.push(row.clone());
        Ok(row)
    }
}

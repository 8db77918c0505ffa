use std::collections::BTreeSet;
use std::{fmt, sync::Arc};

use aiden_model::{
    Employee, EmployeeId, OrganisationId, OsintStatus, PhishingEmail, User,
    DEFAULT_SUBJECT_DOMAIN,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::ensure_member;
use crate::crypto::PayloadCipher;
use crate::database::ports::{
    EmployeeRecord, EmployeesRepository, NewEmployee, OrganisationsRepository,
    OsintUpdate,
};
use crate::error::{AidenError, Result};
use crate::external::{
    CollectorReport, ContentGenerator, GenerationRequest, OsintCollector,
    SubjectDescriptor,
};
use crate::freshness::FreshnessWindow;
use crate::ranking::RankingPolicy;
use crate::result_store::{open_json, seal_json};
use crate::validation;

const NAME_MAX: usize = 80;
const DETAIL_MAX: usize = 120;

/// One row of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// OSINT cache state returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OsintSnapshot {
    pub employee_id: EmployeeId,
    pub status: OsintStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub raw_results: Option<Value>,
    pub ranked: Option<Value>,
    /// `true` when served from the cache without calling the collector.
    pub cached: bool,
}

pub struct EmployeeService {
    employees: Arc<dyn EmployeesRepository>,
    organisations: Arc<dyn OrganisationsRepository>,
    collector: Arc<dyn OsintCollector>,
    generator: Arc<dyn ContentGenerator>,
    cipher: Arc<PayloadCipher>,
    ranking: RankingPolicy,
    freshness: FreshnessWindow,
}

impl fmt::Debug for EmployeeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeService")
            .field("employees_repo", &Arc::strong_count(&self.employees))
            .field("freshness", &self.freshness)
            .finish_non_exhaustive()
    }
}

impl EmployeeService {
    pub fn new(
        employees: Arc<dyn EmployeesRepository>,
        organisations: Arc<dyn OrganisationsRepository>,
        collector: Arc<dyn OsintCollector>,
        generator: Arc<dyn ContentGenerator>,
        cipher: Arc<PayloadCipher>,
        ranking: RankingPolicy,
        freshness: FreshnessWindow,
    ) -> Self {
        Self {
            employees,
            organisations,
            collector,
            generator,
            cipher,
            ranking,
            freshness,
        }
    }

    /// Validate and insert a batch. All-or-nothing: any invalid row,
    /// in-batch duplicate or already registered email rejects the batch.
    pub async fn bulk_upload(
        &self,
        organisation_id: OrganisationId,
        actor: &User,
        rows: Vec<EmployeeInput>,
    ) -> Result<u64> {
        ensure_member(actor, organisation_id)?;
        if rows.is_empty() {
            return Err(AidenError::Validation(
                "employees must contain at least one row".into(),
            ));
        }

        let new_rows = rows
            .iter()
            .enumerate()
            .map(|(index, row)| validate_row(organisation_id, index, row))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<String> = new_rows
            .iter()
            .filter(|row| !seen.insert(row.email.clone()))
            .map(|row| row.email.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(AidenError::DuplicateEmails(
                duplicates.into_iter().collect(),
            ));
        }

        let emails: Vec<String> =
            new_rows.iter().map(|row| row.email.clone()).collect();
        let existing = self
            .employees
            .existing_emails(organisation_id, &emails)
            .await?;
        if !existing.is_empty() {
            return Err(AidenError::ExistingEmails(existing));
        }

        let inserted = self.employees.insert_many(&new_rows).await?;
        info!(
            organisation_id = %organisation_id,
            inserted,
            "employees uploaded"
        );
        Ok(inserted)
    }

    pub async fn list(
        &self,
        organisation_id: OrganisationId,
        actor: &User,
    ) -> Result<Vec<Employee>> {
        ensure_member(actor, organisation_id)?;
        self.employees
            .list_by_organisation(organisation_id)
            .await?
            .into_iter()
            .map(|record| self.decode(record))
            .collect()
    }

    pub async fn delete(&self, id: EmployeeId, actor: &User) -> Result<()> {
        self.authorized_record(id, actor).await?;
        if !self.employees.delete_employee(id).await? {
            return Err(AidenError::NotFound(format!("employee {id}")));
        }
        info!(employee_id = %id, "employee deleted");
        Ok(())
    }

    /// Cached OSINT when fresh, otherwise a new collector call.
    pub async fn refresh_osint(
        &self,
        id: EmployeeId,
        actor: &User,
    ) -> Result<OsintSnapshot> {
        let record = self.authorized_record(id, actor).await?;
        let now = Utc::now();

        if self.freshness.is_fresh(
            record.osint_status,
            record.osint_last_run,
            now,
        ) {
            info!(
                target: "aiden::osint",
                employee_id = %id,
                "OSINT already up to date"
            );
            return self.snapshot(&record, true);
        }

        let subject = self.subject_for(&record).await?;
        match self.collector.gather(&subject).await {
            Ok(report) => {
                let (raw, ranked) = self.cache_payloads(report, now);
                let update = OsintUpdate {
                    raw_enc: raw
                        .as_ref()
                        .map(|v| seal_json(&self.cipher, v))
                        .transpose()?,
                    ranked_enc: ranked
                        .as_ref()
                        .map(|v| seal_json(&self.cipher, v))
                        .transpose()?,
                    status: OsintStatus::Completed,
                    last_run: now,
                };
                self.employees.update_osint(id, &update).await?;
                info!(target: "aiden::osint", employee_id = %id, "OSINT refreshed");

                Ok(OsintSnapshot {
                    employee_id: id,
                    status: OsintStatus::Completed,
                    last_run: Some(now),
                    raw_results: raw,
                    ranked,
                    cached: false,
                })
            }
            Err(err) => {
                warn!(
                    target: "aiden::osint",
                    employee_id = %id,
                    error = %err,
                    "OSINT collection failed"
                );
                let update = OsintUpdate {
                    raw_enc: record.osint_raw_enc.clone(),
                    ranked_enc: record.osint_ranked_enc.clone(),
                    status: OsintStatus::Failed,
                    last_run: now,
                };
                self.employees.update_osint(id, &update).await?;
                Err(err)
            }
        }
    }

    /// Make sure OSINT is available, then generate and store a simulated
    /// phishing email for the employee.
    pub async fn generate_phishing(
        &self,
        id: EmployeeId,
        actor: &User,
    ) -> Result<PhishingEmail> {
        let snapshot = self.refresh_osint(id, actor).await?;
        let record = self.authorized_record(id, actor).await?;

        let request = GenerationRequest {
            full_name: full_name(&record),
            email: record.email.clone(),
            osint_data: snapshot
                .ranked
                .or(snapshot.raw_results)
                .unwrap_or(Value::Null),
        };
        let email = self.generator.generate(&request).await?;

        let sealed = seal_json(&self.cipher, &email)?;
        self.employees
            .store_phishing_email(id, &sealed, Utc::now())
            .await?;
        info!(target: "aiden::osint", employee_id = %id, "phishing email stored");
        Ok(email)
    }

    async fn authorized_record(
        &self,
        id: EmployeeId,
        actor: &User,
    ) -> Result<EmployeeRecord> {
        let record = self
            .employees
            .get_employee(id)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("employee {id}")))?;
        ensure_member(actor, record.organisation_id)?;
        Ok(record)
    }

    async fn subject_for(
        &self,
        record: &EmployeeRecord,
    ) -> Result<SubjectDescriptor> {
        let domain = self
            .organisations
            .get_organisation(record.organisation_id)
            .await?
            .map(|org| org.domain())
            .unwrap_or_else(|| DEFAULT_SUBJECT_DOMAIN.to_string());
        Ok(SubjectDescriptor {
            full_name: full_name(record),
            email: record.email.clone(),
            domain,
        })
    }

    /// Raw and ranked blobs to cache. Structured findings fill in whichever
    /// blob the collector left out.
    fn cache_payloads(
        &self,
        report: CollectorReport,
        now: DateTime<Utc>,
    ) -> (Option<Value>, Option<Value>) {
        let CollectorReport {
            raw_results,
            ranked,
            findings,
        } = report;
        if findings.is_empty() {
            return (raw_results, ranked);
        }

        let raw = raw_results.unwrap_or_else(|| {
            Value::Array(
                findings
                    .iter()
                    .map(|f| {
                        serde_json::json!({
                            "module": f.module,
                            "type": f.kind,
                            "data": f.data,
                            "date_found": f.date_found,
                            "corroboration": f.corroboration,
                        })
                    })
                    .collect(),
            )
        });
        let ranked = ranked.unwrap_or_else(|| {
            let mut scored = self.ranking.rank(findings, now);
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            Value::Array(
                scored
                    .into_iter()
                    .map(|r| {
                        serde_json::json!({
                            "module": r.finding.module,
                            "type": r.finding.kind,
                            "data": r.finding.data,
                            "score": r.score,
                        })
                    })
                    .collect(),
            )
        });
        (Some(raw), Some(ranked))
    }

    fn snapshot(
        &self,
        record: &EmployeeRecord,
        cached: bool,
    ) -> Result<OsintSnapshot> {
        Ok(OsintSnapshot {
            employee_id: record.id,
            status: record.osint_status,
            last_run: record.osint_last_run,
            raw_results: self.open_optional(record.osint_raw_enc.as_deref())?,
            ranked: self.open_optional(record.osint_ranked_enc.as_deref())?,
            cached,
        })
    }

    fn open_optional<T: serde::de::DeserializeOwned>(
        &self,
        sealed: Option<&str>,
    ) -> Result<Option<T>> {
        sealed.map(|s| open_json(&self.cipher, s)).transpose()
    }

    fn decode(&self, record: EmployeeRecord) -> Result<Employee> {
        Ok(Employee {
            osint_raw: self.open_optional(record.osint_raw_enc.as_deref())?,
            osint_ranked: self
                .open_optional(record.osint_ranked_enc.as_deref())?,
            phishing_email: self
                .open_optional(record.phishing_email_enc.as_deref())?,
            id: record.id,
            organisation_id: record.organisation_id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            job_title: record.job_title,
            department: record.department,
            osint_status: record.osint_status,
            osint_last_run: record.osint_last_run,
            phishing_generated_at: record.phishing_generated_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn full_name(record: &EmployeeRecord) -> String {
    format!("{} {}", record.first_name, record.last_name)
        .trim()
        .to_string()
}

fn validate_row(
    organisation_id: OrganisationId,
    index: usize,
    row: &EmployeeInput,
) -> Result<NewEmployee> {
    let field = |name: &str| format!("employees[{index}].{name}");
    Ok(NewEmployee {
        organisation_id,
        first_name: validation::required(
            &field("first_name"),
            &row.first_name,
            NAME_MAX,
        )?,
        last_name: validation::required(
            &field("last_name"),
            &row.last_name,
            NAME_MAX,
        )?,
        email: validation::email(&field("email"), &row.email)?,
        job_title: validation::optional(
            &field("job_title"),
            row.job_title.as_deref(),
            DETAIL_MAX,
        )?,
        department: validation::optional(
            &field("department"),
            row.department.as_deref(),
            DETAIL_MAX,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::database::ports::NewOrganisation;
    use crate::test_support::{
        FixedGenerator, ScriptedCollector, finding, text_report,
    };
    use aiden_model::UserId;

    struct Fixture {
        memory: Arc<InMemoryStore>,
        collector: Arc<ScriptedCollector>,
        generator: Arc<FixedGenerator>,
        service: EmployeeService,
        admin: User,
    }

    async fn fixture() -> Fixture {
        let memory = Arc::new(InMemoryStore::new());
        let org = memory
            .create_organisation(&NewOrganisation {
                name: "Acme".into(),
                website: Some("https://www.acme.test/about".into()),
                industry: None,
                size: None,
            })
            .await
            .unwrap();
        let collector = Arc::new(ScriptedCollector::default());
        let generator = Arc::new(FixedGenerator::new());
        let service = EmployeeService::new(
            memory.clone(),
            memory.clone(),
            collector.clone(),
            generator.clone(),
            Arc::new(PayloadCipher::new([5; 32])),
            RankingPolicy::default(),
            FreshnessWindow::default(),
        );
        let admin = User {
            id: UserId(900),
            organisation_id: org.id,
            name: "Admin".into(),
            email: "admin@acme.test".into(),
            created_at: Utc::now(),
        };
        Fixture {
            memory,
            collector,
            generator,
            service,
            admin,
        }
    }

    fn row(email: &str) -> EmployeeInput {
        EmployeeInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            job_title: Some("Engineer".into()),
            department: None,
        }
    }

    async fn seeded(fx: &Fixture) -> EmployeeId {
        let org = fx.admin.organisation_id;
        fx.service
            .bulk_upload(org, &fx.admin, vec![row("ada@acme.test")])
            .await
            .unwrap();
        fx.service.list(org, &fx.admin).await.unwrap()[0].id
    }

    #[tokio::test]
    async fn upload_normalises_emails() {
        let fx = fixture().await;
        let org = fx.admin.organisation_id;
        let count = fx
            .service
            .bulk_upload(org, &fx.admin, vec![row("  Ada@ACME.test ")])
            .await
            .unwrap();
        assert_eq!(count, 1);

        let listed = fx.service.list(org, &fx.admin).await.unwrap();
        assert_eq!(listed[0].email, "ada@acme.test");
        assert_eq!(listed[0].osint_status, OsintStatus::Pending);
    }

    #[tokio::test]
    async fn duplicates_within_a_batch_reject_everything() {
        let fx = fixture().await;
        let err = fx
            .service
            .bulk_upload(
                fx.admin.organisation_id,
                &fx.admin,
                vec![row("a@acme.test"), row("b@acme.test"), row("A@acme.test")],
            )
            .await
            .unwrap_err();
        match err {
            AidenError::DuplicateEmails(emails) => {
                assert_eq!(emails, vec!["a@acme.test".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fx.memory.employee_count().await, 0);
    }

    #[tokio::test]
    async fn existing_emails_are_reported() {
        let fx = fixture().await;
        let org = fx.admin.organisation_id;
        fx.service
            .bulk_upload(org, &fx.admin, vec![row("a@acme.test")])
            .await
            .unwrap();

        let err = fx
            .service
            .bulk_upload(org, &fx.admin, vec![row("b@acme.test"), row("a@acme.test")])
            .await
            .unwrap_err();
        assert!(
            matches!(err, AidenError::ExistingEmails(ref e) if e == &["a@acme.test".to_string()])
        );
        assert_eq!(fx.memory.employee_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_rows_and_foreign_admins_are_rejected() {
        let fx = fixture().await;
        let org = fx.admin.organisation_id;

        let mut bad = row("a@acme.test");
        bad.first_name = "x".repeat(81);
        let err = fx
            .service
            .bulk_upload(org, &fx.admin, vec![bad])
            .await
            .unwrap_err();
        assert!(matches!(err, AidenError::Validation(_)));

        let err = fx.service.bulk_upload(org, &fx.admin, vec![]).await;
        assert!(matches!(err, Err(AidenError::Validation(_))));

        let mut outsider = fx.admin.clone();
        outsider.organisation_id = OrganisationId(org.0 + 1000);
        let err = fx
            .service
            .bulk_upload(org, &outsider, vec![row("a@acme.test")])
            .await
            .unwrap_err();
        assert!(matches!(err, AidenError::Forbidden(_)));
    }

    #[tokio::test]
    async fn fresh_osint_is_served_from_cache() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.collector.push(Ok(text_report()));

        let first = fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.status, OsintStatus::Completed);

        let second = fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.ranked, first.ranked);
        assert_eq!(fx.collector.calls(), 1);

        let subject = &fx.collector.subjects()[0];
        assert_eq!(subject.full_name, "Ada Lovelace");
        assert_eq!(subject.domain, "www.acme.test");
    }

    #[tokio::test]
    async fn stale_osint_is_collected_again() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.collector.push(Ok(text_report()));
        fx.collector.push(Ok(text_report()));

        fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        fx.memory
            .set_osint_last_run(id, Utc::now() - chrono::Duration::hours(24))
            .await;

        let again = fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        assert!(!again.cached);
        assert_eq!(fx.collector.calls(), 2);
    }

    #[tokio::test]
    async fn failed_collection_keeps_previous_results() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.collector.push(Ok(text_report()));
        fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        fx.memory
            .set_osint_last_run(id, Utc::now() - chrono::Duration::days(2))
            .await;

        fx.collector.push(Err(AidenError::collector("timed out")));
        let err = fx.service.refresh_osint(id, &fx.admin).await.unwrap_err();
        assert!(matches!(err, AidenError::ExternalService { .. }));

        let employee = fx
            .service
            .list(fx.admin.organisation_id, &fx.admin)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(employee.osint_status, OsintStatus::Failed);
        assert_eq!(employee.osint_ranked, text_report().ranked);
    }

    #[tokio::test]
    async fn structured_findings_fill_missing_blobs() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.collector.push(Ok(CollectorReport {
            raw_results: None,
            ranked: None,
            findings: vec![
                finding("EMAILADDR", "weak", 1),
                finding("EMAILADDR", "strong", 5),
            ],
        }));

        let snapshot = fx.service.refresh_osint(id, &fx.admin).await.unwrap();
        let ranked = snapshot.ranked.unwrap();
        assert_eq!(ranked[0]["data"], "strong");
        assert_eq!(ranked[1]["data"], "weak");
        assert_eq!(snapshot.raw_results.unwrap().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn phishing_generation_uses_ranked_osint() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.collector.push(Ok(text_report()));

        let email = fx.service.generate_phishing(id, &fx.admin).await.unwrap();
        assert_eq!(email, FixedGenerator::email());

        let requests = fx.generator.requests.lock().unwrap().clone();
        assert_eq!(requests[0].osint_data, text_report().ranked.unwrap());

        let stored = fx
            .service
            .list(fx.admin.organisation_id, &fx.admin)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(stored.phishing_email, Some(FixedGenerator::email()));
        assert!(stored.phishing_generated_at.is_some());
    }

    #[tokio::test]
    async fn delete_removes_the_employee() {
        let fx = fixture().await;
        let id = seeded(&fx).await;
        fx.service.delete(id, &fx.admin).await.unwrap();
        let err = fx.service.delete(id, &fx.admin).await.unwrap_err();
        assert!(matches!(err, AidenError::NotFound(_)));
    }
}

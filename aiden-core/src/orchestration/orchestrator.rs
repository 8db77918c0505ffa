use std::{fmt, sync::Arc};

use aiden_model::{Finding, ScanEmail, ScanId, ScanRequest, ScanStatus};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use super::config::OrchestratorConfig;
use super::job::ScanJob;
use super::queue::TaskQueue;
use crate::database::ports::ScansRepository;
use crate::error::{AidenError, Result};
use crate::external::{
    CollectorReport, ContentGenerator, GenerationRequest, OsintCollector,
    SubjectDescriptor,
};
use crate::result_store::ResultStore;
use crate::validation;

/// Status and decrypted findings of one scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResults {
    pub scan: ScanRequest,
    pub findings: Vec<Finding>,
}

/// What a worker did with a job.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    Finished { findings: usize },
    Failed { reason: String },
    /// The scan was not pending (duplicate delivery or already handled).
    Skipped,
}

/// Unfinished scans found by [`ScanOrchestrator::recover`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// `pending` scans put back on the queue.
    pub requeued: Vec<ScanId>,
    /// `running` scans moved to `error`; their worker is gone.
    pub interrupted: Vec<ScanId>,
}

/// Reason recorded on scans that were running when the process stopped.
pub const INTERRUPTED_REASON: &str =
    "interrupted: the worker stopped before the scan completed";

/// Owns the scan lifecycle: `pending -> running -> finished | error`.
pub struct ScanOrchestrator {
    scans: Arc<dyn ScansRepository>,
    results: ResultStore,
    collector: Arc<dyn OsintCollector>,
    generator: Arc<dyn ContentGenerator>,
    queue: Arc<dyn TaskQueue>,
    config: OrchestratorConfig,
}

impl fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("queue_depth", &self.queue.len())
            .field("workers", &self.config.workers)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

impl ScanOrchestrator {
    pub fn new(
        scans: Arc<dyn ScansRepository>,
        results: ResultStore,
        collector: Arc<dyn OsintCollector>,
        generator: Arc<dyn ContentGenerator>,
        queue: Arc<dyn TaskQueue>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            scans,
            results,
            collector,
            generator,
            queue,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.queue
    }

    /// Validate, persist a `pending` scan and queue it. Returns as soon as
    /// the job is queued.
    #[instrument(target = "aiden::scan", skip_all)]
    pub async fn initiate(
        &self,
        email: &str,
        consent: Option<bool>,
    ) -> Result<ScanId> {
        let email = validation::email("email", email)?;
        if consent != Some(true) {
            return Err(AidenError::Validation(
                "consent must be explicitly granted".into(),
            ));
        }

        let scan = self.scans.create_scan(&email, true).await?;
        self.dispatch(scan.id, false).await?;
        Ok(scan.id)
    }

    /// Queue a `pending` scan. A refused job moves the scan to `error`.
    /// With `wait`, a full queue delays instead of refusing.
    async fn dispatch(&self, scan_id: ScanId, wait: bool) -> Result<()> {
        let job = ScanJob::new(scan_id);
        let job_id = job.id;

        let queued = if wait {
            self.queue.enqueue_wait(job).await
        } else {
            self.queue.enqueue(job).await
        };
        if let Err(err) = queued {
            let reason = format!("dispatch failed: {err}");
            error!(
                target: "aiden::scan",
                scan_id = %scan_id,
                error = %err,
                "failed to queue scan"
            );
            if let Err(mark_err) = self
                .scans
                .mark_failed(scan_id, ScanStatus::Pending, &reason)
                .await
            {
                warn!(
                    target: "aiden::scan",
                    scan_id = %scan_id,
                    error = %mark_err,
                    "could not record dispatch failure"
                );
            }
            return Err(AidenError::Internal(format!(
                "scan {scan_id} could not be queued: {err}"
            )));
        }

        info!(
            target: "aiden::scan",
            scan_id = %scan_id,
            job_id = %job_id,
            "scan queued"
        );
        Ok(())
    }

    /// Startup pass over scans left unfinished by a previous process.
    /// `pending` scans are queued again; `running` scans lost their worker
    /// and move to `error`. Waits for queue room, so workers must already
    /// be running. Assumes this is the only process serving the database.
    #[instrument(target = "aiden::scan", skip(self))]
    pub async fn recover(&self) -> Result<RecoveryReport> {
        let mut report = RecoveryReport::default();
        for scan in self.scans.list_unfinished().await? {
            match scan.status {
                ScanStatus::Running => {
                    self.scans
                        .mark_failed(
                            scan.id,
                            ScanStatus::Running,
                            INTERRUPTED_REASON,
                        )
                        .await?;
                    warn!(
                        target: "aiden::scan",
                        scan_id = %scan.id,
                        "scan interrupted by restart"
                    );
                    report.interrupted.push(scan.id);
                }
                ScanStatus::Pending => {
                    match self.dispatch(scan.id, true).await {
                        Ok(()) => report.requeued.push(scan.id),
                        // Already recorded as `error` by `dispatch`.
                        Err(AidenError::Internal(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
                ScanStatus::Finished | ScanStatus::Error => {}
            }
        }

        if !report.requeued.is_empty() || !report.interrupted.is_empty() {
            info!(
                target: "aiden::scan",
                requeued = report.requeued.len(),
                interrupted = report.interrupted.len(),
                "recovered unfinished scans"
            );
        }
        Ok(report)
    }

    /// Worker entry point. Claims the scan, collects, ranks and persists.
    /// Collection or persistence failures move the scan to `error`; only a
    /// failure to record that state is returned as `Err`.
    #[instrument(target = "aiden::scan", skip(self), fields(scan_id = %scan_id))]
    pub async fn execute(&self, scan_id: ScanId) -> Result<ExecuteOutcome> {
        if !self.scans.claim_pending(scan_id).await? {
            debug!(target: "aiden::scan", "scan not pending, skipping");
            return Ok(ExecuteOutcome::Skipped);
        }

        let scan = self
            .scans
            .get_scan(scan_id)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("scan {scan_id}")))?;
        info!(target: "aiden::scan", "scan running");

        match self.collect_and_store(&scan).await {
            Ok(findings) => {
                info!(target: "aiden::scan", findings, "scan finished");
                Ok(ExecuteOutcome::Finished { findings })
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(target: "aiden::scan", error = %err, "scan failed");
                self.scans
                    .mark_failed(scan_id, ScanStatus::Running, &reason)
                    .await?;
                Ok(ExecuteOutcome::Failed { reason })
            }
        }
    }

    async fn collect_and_store(&self, scan: &ScanRequest) -> Result<usize> {
        let subject = SubjectDescriptor::from_email(&scan.email);
        let report = self.collect_with_retry(&subject).await?;
        let ranked = self
            .config
            .ranking
            .rank(report.findings, Utc::now());
        self.results.save_findings(scan.id, &ranked).await
    }

    async fn collect_with_retry(
        &self,
        subject: &SubjectDescriptor,
    ) -> Result<CollectorReport> {
        let retry = self.config.retry;
        let mut attempt: u16 = 1;
        loop {
            match self.collector.gather(subject).await {
                Ok(report) => return Ok(report),
                Err(err @ AidenError::ExternalService { .. })
                    if attempt < retry.max_attempts =>
                {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        target: "aiden::scan",
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "collector call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Current status plus decrypted findings, best first. Findings are only
    /// visible once the scan has finished.
    pub async fn get_results(
        &self,
        scan_id: ScanId,
        limit: Option<usize>,
    ) -> Result<ScanResults> {
        let scan = self
            .scans
            .get_scan(scan_id)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("scan {scan_id}")))?;

        let findings = if scan.status == ScanStatus::Finished {
            self.results.read_findings(scan_id, limit).await?
        } else {
            Vec::new()
        };
        Ok(ScanResults { scan, findings })
    }

    /// Ask the generator for a phishing-simulation email built from the
    /// scan's top findings and store it encrypted.
    #[instrument(target = "aiden::scan", skip(self), fields(scan_id = %scan_id))]
    pub async fn generate_email(&self, scan_id: ScanId) -> Result<ScanEmail> {
        let scan = self
            .scans
            .get_scan(scan_id)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("scan {scan_id}")))?;
        if scan.status != ScanStatus::Finished {
            return Err(AidenError::Validation(format!(
                "scan {scan_id} is {}; emails need a finished scan",
                scan.status
            )));
        }

        let top = self
            .results
            .read_findings(scan_id, Some(self.config.email_top_n))
            .await?;
        let osint_data: Vec<_> = top
            .iter()
            .map(|f| {
                json!({
                    "module": f.module,
                    "type": f.kind,
                    "data": f.data,
                    "score": f.score,
                })
            })
            .collect();

        let subject = SubjectDescriptor::from_email(&scan.email);
        let request = GenerationRequest {
            full_name: subject.full_name,
            email: subject.email,
            osint_data: serde_json::Value::Array(osint_data),
        };
        let email = self.generator.generate(&request).await?;
        let stored = self.results.save_scan_email(scan_id, &email).await?;
        info!(target: "aiden::scan", email_id = %stored.id, "scan email stored");
        Ok(stored)
    }

    pub async fn collector_health(&self) -> Result<bool> {
        self.collector.health().await
    }

    /// Execute every queued job inline until the queue is empty.
    pub async fn drain(&self) -> Result<Vec<(ScanId, ExecuteOutcome)>> {
        let mut outcomes = Vec::new();
        while let Some(job) = self.queue.try_dequeue() {
            let outcome = self.execute(job.scan_id).await?;
            outcomes.push((job.scan_id, outcome));
        }
        Ok(outcomes)
    }
}

//! Shared fakes for core integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use aiden_core::crypto::PayloadCipher;
use aiden_core::database::InMemoryStore;
use aiden_core::external::{
    CollectorReport, ContentGenerator, GenerationRequest, OsintCollector,
    RawFinding, SubjectDescriptor,
};
use aiden_core::orchestration::{
    ManualQueue, OrchestratorConfig, ScanOrchestrator, TaskQueue,
};
use aiden_core::result_store::ResultStore;
use aiden_core::{AidenError, Result};
use aiden_model::PhishingEmail;
use async_trait::async_trait;
use chrono::Utc;

pub const TEST_KEY: [u8; 32] = [42; 32];

/// Collector replaying queued responses; errors once the script runs out.
#[derive(Debug, Default)]
pub struct FakeCollector {
    script: Mutex<VecDeque<Result<CollectorReport>>>,
    calls: Mutex<Vec<SubjectDescriptor>>,
    delay: Option<Duration>,
}

impl FakeCollector {
    pub fn with(responses: Vec<Result<CollectorReport>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OsintCollector for FakeCollector {
    async fn gather(
        &self,
        subject: &SubjectDescriptor,
    ) -> Result<CollectorReport> {
        self.calls.lock().unwrap().push(subject.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AidenError::collector("script exhausted")))
    }

    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct FakeGenerator {
    pub requests: Mutex<Vec<GenerationRequest>>,
}

pub fn sample_email() -> PhishingEmail {
    PhishingEmail {
        from_name: "Payroll".into(),
        from_email: "payroll@b.com".into(),
        subject: "Updated payslip".into(),
        body: "Please review your payslip.".into(),
        explanation: None,
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<PhishingEmail> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(sample_email())
    }
}

pub fn finding(data: &str, corroboration: u32) -> RawFinding {
    RawFinding {
        module: "sfp_accounts".into(),
        kind: "ACCOUNT_EXTERNAL_OWNED".into(),
        data: data.into(),
        date_found: Some(Utc::now()),
        corroboration,
    }
}

pub fn report(findings: Vec<RawFinding>) -> CollectorReport {
    CollectorReport {
        findings,
        ..CollectorReport::default()
    }
}

/// Orchestrator over the in-memory store and a manual queue.
pub struct Harness {
    pub memory: Arc<InMemoryStore>,
    pub collector: Arc<FakeCollector>,
    pub generator: Arc<FakeGenerator>,
    pub orchestrator: ScanOrchestrator,
}

impl Harness {
    pub fn new(collector: FakeCollector) -> Self {
        Self::with_queue(collector, Arc::new(ManualQueue::new()))
    }

    pub fn with_queue(
        collector: FakeCollector,
        queue: Arc<dyn TaskQueue>,
    ) -> Self {
        Self::with_config(collector, queue, OrchestratorConfig::default())
    }

    pub fn with_config(
        collector: FakeCollector,
        queue: Arc<dyn TaskQueue>,
        config: OrchestratorConfig,
    ) -> Self {
        let memory = Arc::new(InMemoryStore::new());
        let collector = Arc::new(collector);
        let generator = Arc::new(FakeGenerator::default());
        let results = ResultStore::new(
            memory.clone(),
            memory.clone(),
            Arc::new(PayloadCipher::new(TEST_KEY)),
        );
        let orchestrator = ScanOrchestrator::new(
            memory.clone(),
            results,
            collector.clone(),
            generator.clone(),
            queue,
            config,
        );
        Self {
            memory,
            collector,
            generator,
            orchestrator,
        }
    }
}

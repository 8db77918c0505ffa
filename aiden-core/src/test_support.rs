//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use aiden_model::PhishingEmail;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::error::{AidenError, Result};
use crate::external::{
    CollectorReport, ContentGenerator, GenerationRequest, OsintCollector,
    RawFinding, SubjectDescriptor,
};

#[derive(Debug, Default)]
pub struct ScriptedCollector {
    responses: Mutex<VecDeque<Result<CollectorReport>>>,
    subjects: Mutex<Vec<SubjectDescriptor>>,
    calls: AtomicUsize,
}

impl ScriptedCollector {
    pub fn push(&self, response: Result<CollectorReport>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn subjects(&self) -> Vec<SubjectDescriptor> {
        self.subjects.lock().unwrap().clone()
    }
}

#[async_trait]
impl OsintCollector for ScriptedCollector {
    async fn gather(
        &self,
        subject: &SubjectDescriptor,
    ) -> Result<CollectorReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.subjects.lock().unwrap().push(subject.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AidenError::collector("nothing scripted")))
    }

    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug)]
pub struct FixedGenerator {
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FixedGenerator {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn email() -> PhishingEmail {
        PhishingEmail {
            from_name: "IT Service Desk".into(),
            from_email: "it@corp.test".into(),
            subject: "Password expiry".into(),
            body: "Your password expires today.".into(),
            explanation: Some("Urgency cue".into()),
        }
    }
}

#[async_trait]
impl ContentGenerator for FixedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<PhishingEmail> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Self::email())
    }
}

pub fn finding(kind: &str, data: &str, corroboration: u32) -> RawFinding {
    RawFinding {
        module: "sfp_test".into(),
        kind: kind.into(),
        data: data.into(),
        date_found: Some(Utc::now()),
        corroboration,
    }
}

pub fn text_report() -> CollectorReport {
    CollectorReport {
        raw_results: Some(json!({"accounts": ["github"]})),
        ranked: Some(json!([{"item": "github", "score": 0.9}])),
        findings: Vec::new(),
    }
}

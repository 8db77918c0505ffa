//! Test application over in-memory repositories and scripted services.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use aiden_core::crypto::{AuthCrypto, PayloadCipher};
use aiden_core::database::{InMemoryStore, Repositories};
use aiden_core::external::{
    CollectorReport, ContentGenerator, GenerationRequest, OsintCollector,
    RawFinding, SubjectDescriptor,
};
use aiden_core::orchestration::ManualQueue;
use aiden_core::{AidenError, Result};
use aiden_model::PhishingEmail;
use aiden_server::{
    AppState, Config, ServiceDeps, build_app_state, create_app,
};
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;

/// Collector replaying queued reports; errors once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedCollector {
    script: Mutex<VecDeque<Result<CollectorReport>>>,
    calls: Mutex<usize>,
}

impl ScriptedCollector {
    pub fn push(&self, response: Result<CollectorReport>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl OsintCollector for ScriptedCollector {
    async fn gather(
        &self,
        _subject: &SubjectDescriptor,
    ) -> Result<CollectorReport> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AidenError::collector("connection refused")))
    }

    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct StubGenerator {
    pub requests: Mutex<Vec<GenerationRequest>>,
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<PhishingEmail> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(PhishingEmail {
            from_name: "IT Service Desk".into(),
            from_email: "it@acme.test".into(),
            subject: "Password expiry notice".into(),
            body: "Your password expires today.".into(),
            explanation: Some("Urgency cue".into()),
        })
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

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub memory: Arc<InMemoryStore>,
    pub collector: Arc<ScriptedCollector>,
    pub generator: Arc<StubGenerator>,
}

pub fn build_test_app() -> TestApp {
    let env: HashMap<&str, &str> = HashMap::from([
        ("AUTH_PASSWORD_PEPPER", "test-pepper"),
        ("AUTH_TOKEN_KEY", "test-token-key"),
        ("ORCHESTRATOR_CONFIG_JSON", r#"{"workers": 1}"#),
    ]);
    let config = Config::from_lookup(|key: &str| {
        env.get(key).map(|value| value.to_string())
    })
    .expect("test config");

    let memory = Arc::new(InMemoryStore::new());
    let collector = Arc::new(ScriptedCollector::default());
    let generator = Arc::new(StubGenerator::default());
    let deps = ServiceDeps {
        repositories: Repositories::in_memory(memory.clone()),
        collector: collector.clone(),
        generator: generator.clone(),
        queue: Arc::new(ManualQueue::new()),
        cipher: Arc::new(PayloadCipher::new([7; 32])),
        auth_crypto: Arc::new(
            AuthCrypto::for_tests("test-pepper", "test-token-key")
                .expect("auth crypto"),
        ),
    };
    let state = build_app_state(Arc::new(config), deps);
    let server =
        TestServer::new(create_app(state.clone())).expect("test server");

    TestApp {
        server,
        state,
        memory,
        collector,
        generator,
    }
}

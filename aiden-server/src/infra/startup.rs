use std::{fmt, sync::Arc};

use anyhow::Context;
use chrono::Duration;
use tracing::{info, warn};

use aiden_core::crypto::{AuthCrypto, PayloadCipher};
use aiden_core::database::Repositories;
use aiden_core::external::{
    ContentGenerator, HttpContentGenerator, HttpOsintCollector, OsintCollector,
};
use aiden_core::freshness::FreshnessWindow;
use aiden_core::orchestration::{ChannelQueue, ScanOrchestrator, TaskQueue};
use aiden_core::result_store::ResultStore;
use aiden_core::services::{
    AccountService, ConsentService, EmployeeService, OrganisationService,
};

use crate::infra::{app_state::AppState, config::Config};

/// Everything the services are built from. Production wiring comes from
/// [`ServiceDeps::production`]; tests substitute fakes.
pub struct ServiceDeps {
    pub repositories: Repositories,
    pub collector: Arc<dyn OsintCollector>,
    pub generator: Arc<dyn ContentGenerator>,
    pub queue: Arc<dyn TaskQueue>,
    pub cipher: Arc<PayloadCipher>,
    pub auth_crypto: Arc<AuthCrypto>,
}

impl fmt::Debug for ServiceDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDeps")
            .field("repositories", &self.repositories)
            .field("queue_depth", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl ServiceDeps {
    pub fn production(
        config: &Config,
        repositories: Repositories,
    ) -> anyhow::Result<Self> {
        let key = config
            .encryption_key
            .as_deref()
            .context("ENCRYPTION_KEY must be set")?;
        let cipher = PayloadCipher::from_base64(key)
            .context("ENCRYPTION_KEY is not a base64-encoded 32-byte key")?;

        if config.uses_default_auth_secrets() {
            warn!(
                "AUTH_PASSWORD_PEPPER or AUTH_TOKEN_KEY is unset; using placeholder secrets"
            );
        }
        let auth_crypto =
            AuthCrypto::new(&config.auth_password_pepper, &config.auth_token_key)
                .context("failed to initialise credential hashing")?;

        let collector = HttpOsintCollector::new(
            config.collector_url.clone(),
            config.collector_timeout,
        )?;
        let generator = HttpContentGenerator::new(
            config.generator_url.clone(),
            config.generator_timeout,
        )?;

        Ok(Self {
            repositories,
            collector: Arc::new(collector),
            generator: Arc::new(generator),
            queue: Arc::new(ChannelQueue::new(
                config.orchestrator.queue_capacity,
            )),
            cipher: Arc::new(cipher),
            auth_crypto: Arc::new(auth_crypto),
        })
    }
}

pub fn build_app_state(config: Arc<Config>, deps: ServiceDeps) -> AppState {
    let ServiceDeps {
        repositories: repos,
        collector,
        generator,
        queue,
        cipher,
        auth_crypto,
    } = deps;

    let results = ResultStore::new(
        repos.scans.clone(),
        repos.scan_emails.clone(),
        cipher.clone(),
    );
    let orchestrator = Arc::new(ScanOrchestrator::new(
        repos.scans.clone(),
        results,
        collector.clone(),
        generator.clone(),
        queue,
        config.orchestrator.clone(),
    ));
    let employees = Arc::new(EmployeeService::new(
        repos.employees.clone(),
        repos.organisations.clone(),
        collector,
        generator,
        cipher,
        config.orchestrator.ranking.clone(),
        FreshnessWindow::hours(config.osint_freshness_hours),
    ));
    let organisations =
        Arc::new(OrganisationService::new(repos.organisations.clone()));
    let accounts = Arc::new(AccountService::new(
        repos.users.clone(),
        repos.organisations.clone(),
        auth_crypto,
        Duration::hours(config.auth_token_ttl_hours),
    ));
    let consents = Arc::new(ConsentService::new(repos.consents.clone()));

    info!(
        workers = config.orchestrator.workers,
        queue_capacity = config.orchestrator.queue_capacity,
        freshness_hours = config.osint_freshness_hours,
        "services assembled"
    );

    AppState {
        config,
        orchestrator,
        employees,
        organisations,
        accounts,
        consents,
    }
}

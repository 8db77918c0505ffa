use std::{fmt, sync::Arc};

use aiden_core::orchestration::ScanOrchestrator;
use aiden_core::services::{
    AccountService, ConsentService, EmployeeService, OrganisationService,
};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<ScanOrchestrator>,
    pub employees: Arc<EmployeeService>,
    pub organisations: Arc<OrganisationService>,
    pub accounts: Arc<AccountService>,
    pub consents: Arc<ConsentService>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub mod memory;
pub mod ports;
pub mod postgres;

use std::{fmt, sync::Arc};

pub use memory::InMemoryStore;
pub use postgres::{PoolSettings, PostgresDatabase};

use ports::{
    ConsentsRepository, EmployeesRepository, OrganisationsRepository,
    ScanEmailsRepository, ScansRepository, UsersRepository,
};
use postgres::{
    PostgresConsentsRepository, PostgresEmployeesRepository,
    PostgresOrganisationsRepository, PostgresScanEmailsRepository,
    PostgresScansRepository, PostgresUsersRepository,
};

/// One handle per repository port, shared by services.
#[derive(Clone)]
pub struct Repositories {
    pub scans: Arc<dyn ScansRepository>,
    pub scan_emails: Arc<dyn ScanEmailsRepository>,
    pub employees: Arc<dyn EmployeesRepository>,
    pub organisations: Arc<dyn OrganisationsRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub consents: Arc<dyn ConsentsRepository>,
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories")
            .field("scans", &Arc::strong_count(&self.scans))
            .field("employees", &Arc::strong_count(&self.employees))
            .field("organisations", &Arc::strong_count(&self.organisations))
            .field("users", &Arc::strong_count(&self.users))
            .finish_non_exhaustive()
    }
}

impl Repositories {
    pub fn postgres(database: &PostgresDatabase) -> Self {
        let pool = database.pool().clone();
        Self {
            scans: Arc::new(PostgresScansRepository::new(pool.clone())),
            scan_emails: Arc::new(PostgresScanEmailsRepository::new(
                pool.clone(),
            )),
            employees: Arc::new(PostgresEmployeesRepository::new(pool.clone())),
            organisations: Arc::new(PostgresOrganisationsRepository::new(
                pool.clone(),
            )),
            users: Arc::new(PostgresUsersRepository::new(pool.clone())),
            consents: Arc::new(PostgresConsentsRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            scans: store.clone(),
            scan_emails: store.clone(),
            employees: store.clone(),
            organisations: store.clone(),
            users: store.clone(),
            consents: store,
        }
    }
}

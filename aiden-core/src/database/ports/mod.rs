//! Repository ports. Adapters live in `database::postgres` and
//! `database::memory`.

pub mod consents;
pub mod employees;
pub mod organisations;
pub mod scan_emails;
pub mod scans;
pub mod users;

pub use consents::{ConsentsRepository, NewConsent};
pub use employees::{EmployeeRecord, EmployeesRepository, NewEmployee, OsintUpdate};
pub use organisations::{
    NewOrganisation, OrganisationUpdate, OrganisationsRepository, SettingsUpdate,
};
pub use scan_emails::{ScanEmailRecord, ScanEmailsRepository};
pub use scans::{NewFinding, ScansRepository};
pub use users::{NewUser, UsersRepository};

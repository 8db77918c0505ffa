//! Core data model definitions shared across Aiden crates.
#![allow(missing_docs)]

pub mod consent;
pub mod email;
pub mod employee;
pub mod error;
pub mod ids;
pub mod organisation;
pub mod scan;
pub mod user;

// Intentionally curated re-exports for downstream consumers.
pub use consent::Consent;
pub use email::{PhishingEmail, ScanEmail};
pub use employee::{Employee, OsintStatus};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    ConsentId, EmployeeId, FindingId, OrganisationId, ScanEmailId, ScanId,
    UserId,
};
pub use organisation::{
    DEFAULT_SUBJECT_DOMAIN, Organisation, OrganisationSettings,
    SimulationFrequency,
};
pub use scan::{Finding, ScanRequest, ScanStatus};
pub use user::User;

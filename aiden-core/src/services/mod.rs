//! Domain services behind the HTTP API.

pub mod accounts;
pub mod consents;
pub mod employees;
pub mod organisations;

pub use accounts::{AccountService, AdminRegistration, LoginSession};
pub use consents::{ConsentService, ConsentSubmission};
pub use employees::{EmployeeInput, EmployeeService, OsintSnapshot};
pub use organisations::{OrganisationInput, OrganisationService, SettingsInput};

use aiden_model::{OrganisationId, User};

use crate::error::{AidenError, Result};

/// The acting admin must belong to `organisation_id`.
pub(crate) fn ensure_member(
    actor: &User,
    organisation_id: OrganisationId,
) -> Result<()> {
    if actor.organisation_id == organisation_id {
        Ok(())
    } else {
        Err(AidenError::Forbidden(format!(
            "user {} does not belong to organisation {organisation_id}",
            actor.id
        )))
    }
}

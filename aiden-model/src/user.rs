use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrganisationId, UserId};

/// Organisation administrator. The password hash never leaves storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organisation_id: OrganisationId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

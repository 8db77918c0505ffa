use aiden_model::{
    Organisation, OrganisationId, OrganisationSettings, SimulationFrequency,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganisation {
    pub name: String,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
}

/// Full replacement of the writable organisation fields.
pub type OrganisationUpdate = NewOrganisation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub frequency: SimulationFrequency,
    pub timezone: String,
    pub start_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait OrganisationsRepository: Send + Sync {
    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> Result<Organisation>;

    async fn get_organisation(
        &self,
        id: OrganisationId,
    ) -> Result<Option<Organisation>>;

    /// `None` when the organisation does not exist.
    async fn update_organisation(
        &self,
        id: OrganisationId,
        update: &OrganisationUpdate,
    ) -> Result<Option<Organisation>>;

    async fn get_settings(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Option<OrganisationSettings>>;

    async fn upsert_settings(
        &self,
        organisation_id: OrganisationId,
        settings: &SettingsUpdate,
    ) -> Result<OrganisationSettings>;
}

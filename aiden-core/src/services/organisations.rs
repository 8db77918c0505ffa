use std::{fmt, sync::Arc};

use aiden_model::{
    Organisation, OrganisationId, OrganisationSettings, SimulationFrequency,
    User,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::ensure_member;
use crate::database::ports::{
    NewOrganisation, OrganisationsRepository, SettingsUpdate,
};
use crate::error::{AidenError, Result};
use crate::validation;

const NAME_MAX: usize = 120;
const WEBSITE_MAX: usize = 255;
const INDUSTRY_MAX: usize = 120;
const SIZE_MAX: usize = 30;
const TIMEZONE_MAX: usize = 60;

/// Writable organisation profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrganisationInput {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettingsInput {
    pub simulation_frequency: String,
    pub timezone: String,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
}

impl OrganisationInput {
    fn validate(&self) -> Result<NewOrganisation> {
        Ok(NewOrganisation {
            name: validation::required("name", &self.name, NAME_MAX)?,
            website: validation::optional_url(
                "website",
                self.website.as_deref(),
                WEBSITE_MAX,
            )?,
            industry: validation::optional(
                "industry",
                self.industry.as_deref(),
                INDUSTRY_MAX,
            )?,
            size: validation::optional("size", self.size.as_deref(), SIZE_MAX)?,
        })
    }
}

impl SettingsInput {
    fn validate(&self) -> Result<SettingsUpdate> {
        let frequency = self
            .simulation_frequency
            .trim()
            .parse::<SimulationFrequency>()
            .map_err(|_| {
                AidenError::Validation(
                    "simulation_frequency must be one of daily, weekly, \
                     biweekly, monthly"
                        .into(),
                )
            })?;
        Ok(SettingsUpdate {
            frequency,
            timezone: validation::required(
                "timezone",
                &self.timezone,
                TIMEZONE_MAX,
            )?,
            start_at: self.start_at,
        })
    }
}

pub struct OrganisationService {
    organisations: Arc<dyn OrganisationsRepository>,
}

impl fmt::Debug for OrganisationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrganisationService")
            .field(
                "organisations_repo",
                &Arc::strong_count(&self.organisations),
            )
            .finish()
    }
}

impl OrganisationService {
    pub fn new(organisations: Arc<dyn OrganisationsRepository>) -> Self {
        Self { organisations }
    }

    /// Public sign-up step; no authentication required.
    pub async fn create(&self, input: &OrganisationInput) -> Result<Organisation> {
        let organisation =
            self.organisations.create_organisation(&input.validate()?).await?;
        info!(organisation_id = %organisation.id, "organisation created");
        Ok(organisation)
    }

    pub async fn get(
        &self,
        id: OrganisationId,
        actor: &User,
    ) -> Result<Organisation> {
        ensure_member(actor, id)?;
        self.organisations
            .get_organisation(id)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("organisation {id}")))
    }

    pub async fn update(
        &self,
        id: OrganisationId,
        actor: &User,
        input: &OrganisationInput,
    ) -> Result<Organisation> {
        ensure_member(actor, id)?;
        let update = input.validate()?;
        self.organisations
            .update_organisation(id, &update)
            .await?
            .ok_or_else(|| AidenError::NotFound(format!("organisation {id}")))
    }

    pub async fn get_settings(
        &self,
        id: OrganisationId,
        actor: &User,
    ) -> Result<Option<OrganisationSettings>> {
        ensure_member(actor, id)?;
        self.organisations.get_settings(id).await
    }

    /// Create or replace the simulation schedule.
    pub async fn upsert_settings(
        &self,
        id: OrganisationId,
        actor: &User,
        input: &SettingsInput,
    ) -> Result<OrganisationSettings> {
        ensure_member(actor, id)?;
        let settings = self
            .organisations
            .upsert_settings(id, &input.validate()?)
            .await?;
        info!(
            organisation_id = %id,
            frequency = %settings.frequency,
            "simulation settings saved"
        );
        Ok(settings)
    }
}

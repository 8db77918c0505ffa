use aiden_model::{Organisation, OrganisationId, OrganisationSettings};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgRow};

use super::{column, is_foreign_key_violation, parse_enum, query_failed};
use crate::database::ports::{
    NewOrganisation, OrganisationUpdate, OrganisationsRepository,
    SettingsUpdate,
};
use crate::error::{AidenError, Result};

const ORGANISATION_COLUMNS: &str =
    "id, name, website, industry, size, logo_path, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresOrganisationsRepository {
    pool: PgPool,
}

impl PostgresOrganisationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_organisation(row: &PgRow) -> Result<Organisation> {
        Ok(Organisation {
            id: OrganisationId(column(row, "id")?),
            name: column(row, "name")?,
            website: column(row, "website")?,
            industry: column(row, "industry")?,
            size: column(row, "size")?,
            logo_path: column(row, "logo_path")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    fn map_settings(row: &PgRow) -> Result<OrganisationSettings> {
        Ok(OrganisationSettings {
            organisation_id: OrganisationId(column(row, "organisation_id")?),
            frequency: parse_enum("frequency", column(row, "frequency")?)?,
            timezone: column(row, "timezone")?,
            start_at: column(row, "start_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }
}

#[async_trait]
impl OrganisationsRepository for PostgresOrganisationsRepository {
    async fn create_organisation(
        &self,
        organisation: &NewOrganisation,
    ) -> Result<Organisation> {
        let row = sqlx::query(&format!(
            "INSERT INTO organisations (name, website, industry, size) \
             VALUES ($1, $2, $3, $4) RETURNING {ORGANISATION_COLUMNS}"
        ))
        .bind(&organisation.name)
        .bind(&organisation.website)
        .bind(&organisation.industry)
        .bind(&organisation.size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to create organisation", e))?;

        Self::map_organisation(&row)
    }

    async fn get_organisation(
        &self,
        id: OrganisationId,
    ) -> Result<Option<Organisation>> {
        let row = sqlx::query(&format!(
            "SELECT {ORGANISATION_COLUMNS} FROM organisations WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load organisation", e))?;

        row.as_ref().map(Self::map_organisation).transpose()
    }

    async fn update_organisation(
        &self,
        id: OrganisationId,
        update: &OrganisationUpdate,
    ) -> Result<Option<Organisation>> {
        let row = sqlx::query(&format!(
            "UPDATE organisations \
             SET name = $2, website = $3, industry = $4, size = $5, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {ORGANISATION_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(&update.name)
        .bind(&update.website)
        .bind(&update.industry)
        .bind(&update.size)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to update organisation", e))?;

        row.as_ref().map(Self::map_organisation).transpose()
    }

    async fn get_settings(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Option<OrganisationSettings>> {
        let row = sqlx::query(
            r#"
            SELECT organisation_id, frequency, timezone, start_at, updated_at
            FROM organisation_settings
            WHERE organisation_id = $1
            "#,
        )
        .bind(organisation_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load settings", e))?;

        row.as_ref().map(Self::map_settings).transpose()
    }

    async fn upsert_settings(
        &self,
        organisation_id: OrganisationId,
        settings: &SettingsUpdate,
    ) -> Result<OrganisationSettings> {
        let row = sqlx::query(
            r#"
            INSERT INTO organisation_settings
                (organisation_id, frequency, timezone, start_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (organisation_id) DO UPDATE
            SET frequency = EXCLUDED.frequency,
                timezone = EXCLUDED.timezone,
                start_at = EXCLUDED.start_at,
                updated_at = NOW()
            RETURNING organisation_id, frequency, timezone, start_at,
                      updated_at
            "#,
        )
        .bind(organisation_id.as_i64())
        .bind(settings.frequency.as_str())
        .bind(&settings.timezone)
        .bind(settings.start_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AidenError::NotFound(format!("organisation {organisation_id}"))
            } else {
                query_failed("Failed to save settings", e)
            }
        })?;

        Self::map_settings(&row)
    }
}

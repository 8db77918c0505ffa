use aiden_model::{Consent, ConsentId};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgRow};

use super::{column, query_failed};
use crate::database::ports::{ConsentsRepository, NewConsent};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PostgresConsentsRepository {
    pool: PgPool,
}

impl PostgresConsentsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<Consent> {
        Ok(Consent {
            id: ConsentId(column(row, "id")?),
            name: column(row, "name")?,
            email: column(row, "email")?,
            target: column(row, "target")?,
            agreed_at: column(row, "agreed_at")?,
            ip: column(row, "ip")?,
            user_agent: column(row, "user_agent")?,
            meta: column(row, "meta")?,
        })
    }
}

#[async_trait]
impl ConsentsRepository for PostgresConsentsRepository {
    async fn insert_consent(&self, consent: &NewConsent) -> Result<Consent> {
        let row = sqlx::query(
            r#"
            INSERT INTO consents
                (name, email, target, agreed_at, ip, user_agent, meta)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, target, agreed_at, ip, user_agent, meta
            "#,
        )
        .bind(&consent.name)
        .bind(&consent.email)
        .bind(&consent.target)
        .bind(consent.agreed_at)
        .bind(&consent.ip)
        .bind(&consent.user_agent)
        .bind(&consent.meta)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to record consent", e))?;

        Self::map_row(&row)
    }
}

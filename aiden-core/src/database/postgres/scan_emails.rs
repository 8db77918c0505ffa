use aiden_model::{ScanEmailId, ScanId};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgRow};

use super::{column, is_foreign_key_violation, query_failed};
use crate::database::ports::{ScanEmailRecord, ScanEmailsRepository};
use crate::error::{AidenError, Result};

#[derive(Debug, Clone)]
pub struct PostgresScanEmailsRepository {
    pool: PgPool,
}

impl PostgresScanEmailsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<ScanEmailRecord> {
        Ok(ScanEmailRecord {
            id: ScanEmailId(column(row, "id")?),
            scan_id: ScanId(column(row, "scan_request_id")?),
            content: column(row, "content")?,
            created_at: column(row, "created_at")?,
        })
    }
}

#[async_trait]
impl ScanEmailsRepository for PostgresScanEmailsRepository {
    async fn insert_scan_email(
        &self,
        scan_id: ScanId,
        content: &str,
    ) -> Result<ScanEmailRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO scan_emails (scan_request_id, content)
            VALUES ($1, $2)
            RETURNING id, scan_request_id, content, created_at
            "#,
        )
        .bind(scan_id.as_i64())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AidenError::NotFound(format!("scan {scan_id}"))
            } else {
                query_failed("Failed to store scan email", e)
            }
        })?;

        Self::map_row(&row)
    }

    async fn latest_for_scan(
        &self,
        scan_id: ScanId,
    ) -> Result<Option<ScanEmailRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, scan_request_id, content, created_at
            FROM scan_emails
            WHERE scan_request_id = $1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(scan_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load scan email", e))?;

        row.as_ref().map(Self::map_row).transpose()
    }
}

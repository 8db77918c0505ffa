use aiden_model::{Finding, FindingId, ScanId, ScanRequest, ScanStatus};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgRow};

use super::{column, parse_enum, query_failed};
use crate::database::ports::{NewFinding, ScansRepository};
use crate::error::{AidenError, Result};

const SCAN_COLUMNS: &str =
    "id, email, consent, status, failure_reason, requested_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresScansRepository {
    pool: PgPool,
}

impl PostgresScansRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_scan(row: &PgRow) -> Result<ScanRequest> {
        Ok(ScanRequest {
            id: ScanId(column(row, "id")?),
            email: column(row, "email")?,
            consent: column(row, "consent")?,
            status: parse_enum("status", column(row, "status")?)?,
            failure_reason: column(row, "failure_reason")?,
            requested_at: column(row, "requested_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    fn map_finding(row: &PgRow) -> Result<Finding> {
        let corroboration: i32 = column(row, "corroboration")?;
        Ok(Finding {
            id: FindingId(column(row, "id")?),
            scan_id: ScanId(column(row, "scan_request_id")?),
            module: column(row, "module")?,
            kind: column(row, "type")?,
            data: column(row, "data")?,
            date_found: column(row, "date_found")?,
            corroboration: u32::try_from(corroboration).map_err(|_| {
                AidenError::Database(format!(
                    "Negative corroboration stored: {corroboration}"
                ))
            })?,
            score: column(row, "score")?,
        })
    }

    async fn current_status(&self, id: ScanId) -> Result<ScanStatus> {
        self.get_scan(id)
            .await?
            .map(|scan| scan.status)
            .ok_or_else(|| AidenError::NotFound(format!("scan {id}")))
    }
}

#[async_trait]
impl ScansRepository for PostgresScansRepository {
    async fn create_scan(
        &self,
        email: &str,
        consent: bool,
    ) -> Result<ScanRequest> {
        let row = sqlx::query(&format!(
            "INSERT INTO scan_requests (email, consent, status) \
             VALUES ($1, $2, 'pending') RETURNING {SCAN_COLUMNS}"
        ))
        .bind(email)
        .bind(consent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to create scan request", e))?;

        Self::map_scan(&row)
    }

    async fn get_scan(&self, id: ScanId) -> Result<Option<ScanRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {SCAN_COLUMNS} FROM scan_requests WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load scan request", e))?;

        row.as_ref().map(Self::map_scan).transpose()
    }

    async fn list_unfinished(&self) -> Result<Vec<ScanRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {SCAN_COLUMNS} FROM scan_requests \
             WHERE status IN ('pending', 'running') ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list unfinished scans", e))?;

        rows.iter().map(Self::map_scan).collect()
    }

    async fn claim_pending(&self, id: ScanId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scan_requests
            SET status = 'running', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to claim scan request", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_with_findings(
        &self,
        id: ScanId,
        findings: &[NewFinding],
    ) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to start transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE scan_requests
            SET status = 'finished', updated_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| query_failed("Failed to finish scan request", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| query_failed("Failed to roll back", e))?;
            let status = self.current_status(id).await?;
            return Err(AidenError::InvalidTransition {
                from: status.to_string(),
                to: ScanStatus::Finished.to_string(),
            });
        }

        for finding in findings {
            let corroboration =
                i32::try_from(finding.corroboration).unwrap_or(i32::MAX);
            sqlx::query(
                r#"
                INSERT INTO osint_results
                    (scan_request_id, module, type, data, date_found,
                     corroboration, score)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id.as_i64())
            .bind(&finding.module)
            .bind(&finding.kind)
            .bind(&finding.data)
            .bind(finding.date_found)
            .bind(corroboration)
            .bind(finding.score)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_failed("Failed to store finding", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit findings", e))?;
        Ok(findings.len())
    }

    async fn mark_failed(
        &self,
        id: ScanId,
        from: ScanStatus,
        reason: &str,
    ) -> Result<()> {
        from.transition(ScanStatus::Error)?;

        let result = sqlx::query(
            r#"
            UPDATE scan_requests
            SET status = 'error', failure_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_i64())
        .bind(from.as_str())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to mark scan as failed", e))?;

        if result.rows_affected() == 0 {
            let status = self.current_status(id).await?;
            return Err(AidenError::InvalidTransition {
                from: status.to_string(),
                to: ScanStatus::Error.to_string(),
            });
        }
        Ok(())
    }

    async fn list_findings(
        &self,
        id: ScanId,
        limit: Option<usize>,
    ) -> Result<Vec<Finding>> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query(
            r#"
            SELECT id, scan_request_id, module, type, data, date_found,
                   corroboration, score
            FROM osint_results
            WHERE scan_request_id = $1
            ORDER BY score DESC, id ASC
            LIMIT $2
            "#,
        )
        .bind(id.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load findings", e))?;

        rows.iter().map(Self::map_finding).collect()
    }
}

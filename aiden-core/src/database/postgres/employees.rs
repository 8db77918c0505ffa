use aiden_model::{EmployeeId, OrganisationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgRow};

use super::{column, is_unique_violation, parse_enum, query_failed};
use crate::database::ports::{
    EmployeeRecord, EmployeesRepository, NewEmployee, OsintUpdate,
};
use crate::error::{AidenError, Result};

const EMPLOYEE_COLUMNS: &str = "id, organisation_id, first_name, last_name, \
    email, job_title, department, osint_raw, osint_ranked, osint_status, \
    osint_last_run, phishing_email, phishing_generated_at, created_at, \
    updated_at";

#[derive(Debug, Clone)]
pub struct PostgresEmployeesRepository {
    pool: PgPool,
}

impl PostgresEmployeesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<EmployeeRecord> {
        Ok(EmployeeRecord {
            id: EmployeeId(column(row, "id")?),
            organisation_id: OrganisationId(column(row, "organisation_id")?),
            first_name: column(row, "first_name")?,
            last_name: column(row, "last_name")?,
            email: column(row, "email")?,
            job_title: column(row, "job_title")?,
            department: column(row, "department")?,
            osint_raw_enc: column(row, "osint_raw")?,
            osint_ranked_enc: column(row, "osint_ranked")?,
            osint_status: parse_enum(
                "osint_status",
                column(row, "osint_status")?,
            )?,
            osint_last_run: column(row, "osint_last_run")?,
            phishing_email_enc: column(row, "phishing_email")?,
            phishing_generated_at: column(row, "phishing_generated_at")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }
}

#[async_trait]
impl EmployeesRepository for PostgresEmployeesRepository {
    async fn insert_many(&self, rows: &[NewEmployee]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to start transaction", e))?;

        let mut inserted = 0u64;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO employees
                    (organisation_id, first_name, last_name, email,
                     job_title, department)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.organisation_id.as_i64())
            .bind(&row.first_name)
            .bind(&row.last_name)
            .bind(&row.email)
            .bind(&row.job_title)
            .bind(&row.department)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AidenError::ExistingEmails(vec![row.email.clone()])
                } else {
                    query_failed("Failed to insert employee", e)
                }
            })?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit employees", e))?;
        Ok(inserted)
    }

    async fn existing_emails(
        &self,
        organisation_id: OrganisationId,
        emails: &[String],
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT email FROM employees
            WHERE organisation_id = $1 AND email = ANY($2)
            ORDER BY email
            "#,
        )
        .bind(organisation_id.as_i64())
        .bind(emails)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to check existing emails", e))?;

        rows.iter().map(|row| column(row, "email")).collect()
    }

    async fn list_by_organisation(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<Vec<EmployeeRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees \
             WHERE organisation_id = $1 ORDER BY id"
        ))
        .bind(organisation_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list employees", e))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn get_employee(
        &self,
        id: EmployeeId,
    ) -> Result<Option<EmployeeRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load employee", e))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete_employee(&self, id: EmployeeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to delete employee", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_osint(
        &self,
        id: EmployeeId,
        update: &OsintUpdate,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET osint_raw = $2,
                osint_ranked = $3,
                osint_status = $4,
                osint_last_run = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(&update.raw_enc)
        .bind(&update.ranked_enc)
        .bind(update.status.as_str())
        .bind(update.last_run)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to store OSINT results", e))?;

        if result.rows_affected() == 0 {
            return Err(AidenError::NotFound(format!("employee {id}")));
        }
        Ok(())
    }

    async fn store_phishing_email(
        &self,
        id: EmployeeId,
        content_enc: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET phishing_email = $2,
                phishing_generated_at = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(content_enc)
        .bind(generated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to store phishing email", e))?;

        if result.rows_affected() == 0 {
            return Err(AidenError::NotFound(format!("employee {id}")));
        }
        Ok(())
    }
}

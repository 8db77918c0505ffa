use aiden_model::{OrganisationId, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgRow};

use super::{column, is_unique_violation, query_failed};
use crate::database::ports::{NewUser, UsersRepository};
use crate::error::{AidenError, Result};

#[derive(Debug, Clone)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId(column(row, "id")?),
            organisation_id: OrganisationId(column(row, "organisation_id")?),
            name: column(row, "name")?,
            email: column(row, "email")?,
            created_at: column(row, "created_at")?,
        })
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (organisation_id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organisation_id, name, email, created_at
            "#,
        )
        .bind(user.organisation_id.as_i64())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AidenError::Conflict("email is already registered".into())
            } else {
                query_failed("Failed to create user", e)
            }
        })?;

        Self::map_user(&row)
    }

    async fn organisation_has_admin(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE organisation_id = $1)",
        )
        .bind(organisation_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to check organisation admin", e))
    }

    async fn email_taken(&self, email: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to check email", e))
    }

    async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        let row = sqlx::query(
            r#"
            SELECT id, organisation_id, name, email, created_at, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to load credentials", e))?;

        row.as_ref()
            .map(|row| -> Result<(User, String)> {
                Ok((Self::map_user(row)?, column(row, "password_hash")?))
            })
            .transpose()
    }

    async fn store_token(
        &self,
        user: &User,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token_hash)
        .bind(user.id.as_i64())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to store token", e))?;
        Ok(())
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.organisation_id, u.name, u.email, u.created_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to resolve token", e))?;

        row.as_ref().map(Self::map_user).transpose()
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to revoke token", e))?;
        Ok(())
    }
}

//! PostgreSQL adapters for the repository ports.

mod consents;
mod employees;
mod organisations;
mod scan_emails;
mod scans;
mod users;

pub use consents::PostgresConsentsRepository;
pub use employees::PostgresEmployeesRepository;
pub use organisations::PostgresOrganisationsRepository;
pub use scan_emails::PostgresScanEmailsRepository;
pub use scans::PostgresScansRepository;
pub use users::PostgresUsersRepository;

use std::{fmt, time::Duration};

use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgPoolOptions, PgRow},
};
use tracing::info;

use crate::error::{AidenError, Result};

/// Pool sizing for [`PostgresDatabase::connect`].
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    settings: PoolSettings,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.settings.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(url: &str, settings: PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(url)
            .await
            .map_err(|e| {
                AidenError::Database(format!("Database connection failed: {e}"))
            })?;

        info!(
            max_connections = settings.max_connections,
            "connected to PostgreSQL"
        );
        Ok(Self { pool, settings })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            settings: PoolSettings::default(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            AidenError::Database(format!("Migration failed: {e}"))
        })?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Typed column read with a uniform error.
pub(crate) fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| {
        AidenError::Database(format!("Failed to read column {name}: {e}"))
    })
}

pub(crate) fn query_failed(context: &str, err: sqlx::Error) -> AidenError {
    AidenError::Database(format!("{context}: {err}"))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

fn parse_enum<T>(name: &str, raw: String) -> Result<T>
where
    T: std::str::FromStr<Err = aiden_model::ModelError>,
{
    raw.parse().map_err(|e| {
        AidenError::Database(format!("Invalid value in column {name}: {e}"))
    })
}

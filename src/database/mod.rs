use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config;

pub mod admins;
pub mod models;
pub mod students;

/// Errors from the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    Config(&'static str),

    /// Unique constraint violation on email or mobile.
    #[error("{0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// OTP missing, mismatched, or expired. Collapsed to one kind by design.
    #[error("invalid or expired OTP")]
    OtpInvalid,

    #[error("stored credential hash is corrupt: {0}")]
    CorruptHash(String),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<crate::auth::password::PasswordError> for StoreError {
    fn from(err: crate::auth::password::PasswordError) -> Self {
        StoreError::CorruptHash(err.to_string())
    }
}

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Get the shared connection pool, creating it lazily from `DATABASE_URL`.
pub async fn pool() -> Result<PgPool, StoreError> {
    let pool = POOL
        .get_or_try_init(|| async {
            let url = std::env::var("DATABASE_URL")
                .map_err(|_| StoreError::Config("DATABASE_URL"))?;
            let db = &config::config().database;

            let pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .acquire_timeout(Duration::from_secs(db.connect_timeout_secs))
                .connect(&url)
                .await?;

            info!("Connected database pool ({} max connections)", db.max_connections);
            Ok::<_, StoreError>(pool)
        })
        .await?;

    Ok(pool.clone())
}

/// Connect and run pending migrations. Called once at startup.
pub async fn connect_and_migrate() -> Result<PgPool, StoreError> {
    let pool = pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations up to date");
    Ok(pool)
}

/// Pings the pool to ensure connectivity.
pub async fn health_check() -> Result<(), StoreError> {
    let pool = pool().await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(())
}

/// True when a sqlx error is a postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

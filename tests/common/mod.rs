//! Shared helpers for the database-backed integration tests.
//!
//! These suites need a reachable postgres. When `DATABASE_URL` is unset they
//! skip instead of failing, so the hermetic tests still run anywhere.

#![allow(dead_code)]

use std::future::Future;
use std::sync::OnceLock;

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Connect to the test database and bring the schema up to date, or `None`
/// when no `DATABASE_URL` is configured.
pub async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    };

    let pool = PgPool::connect(&url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(pool))
}

pub fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4().simple())
}

/// A fresh 10-digit mobile number.
pub fn unique_mobile() -> String {
    (6_000_000_000u64 + rand::random::<u64>() % 1_000_000_000).to_string()
}

pub struct AuthEnv {
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Process-stable auth environment. The config singleton latches on first
/// access, so every test in a binary must present the same values.
pub fn auth_env() -> &'static AuthEnv {
    static ENV: OnceLock<AuthEnv> = OnceLock::new();
    ENV.get_or_init(|| AuthEnv {
        jwt_secret: "integration-test-secret".to_string(),
        admin_email: unique_email("admin"),
        admin_password: format!("reset-{}", Uuid::new_v4().simple()),
    })
}

/// Run a test body with the auth environment in place. `temp_env` serializes
/// callers, so the singleton can only ever latch these values.
pub async fn with_auth_env<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    let env = auth_env();
    temp_env::async_with_vars(
        [
            ("JWT_SECRET", Some(env.jwt_secret.as_str())),
            ("JWT_EXPIRES_DAYS", Some("7")),
            ("ADMIN_EMAIL", Some(env.admin_email.as_str())),
            ("ADMIN_PASSWORD", Some(env.admin_password.as_str())),
            ("ADMIN_LOGIN_PINNED", Some("true")),
        ],
        fut,
    )
    .await
}

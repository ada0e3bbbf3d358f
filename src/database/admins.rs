//! Admin credential store.

use sqlx::PgPool;
use uuid::Uuid;

use super::models::Admin;
use super::{is_unique_violation, StoreError};
use crate::auth::password;

const ADMIN_COLUMNS: &str =
    "id, email, password_hash, reset_token, reset_token_expires_at, created_at";

pub struct AdminStore {
    pool: PgPool,
}

impl AdminStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, email: &str, plaintext: &str) -> Result<Admin, StoreError> {
        let password_hash = password::hash_password(plaintext)?;

        let query = format!(
            "INSERT INTO admins (email, password_hash) VALUES (lower($1), $2) \
             RETURNING {ADMIN_COLUMNS}"
        );

        sqlx::query_as::<_, Admin>(&query)
            .bind(email.trim())
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate("Admin already exists".to_string())
                } else {
                    StoreError::Sqlx(e)
                }
            })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = lower($1)");

        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Admin>, StoreError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");

        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub fn verify_password(admin: &Admin, candidate: &str) -> Result<bool, StoreError> {
        Ok(password::verify_password(&admin.password_hash, candidate)?)
    }

    /// Password change re-hashes and wipes any outstanding reset token.
    pub async fn set_password(&self, admin_id: Uuid, new_password: &str) -> Result<(), StoreError> {
        let password_hash = password::hash_password(new_password)?;

        let result = sqlx::query(
            "UPDATE admins \
             SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL \
             WHERE id = $1",
        )
        .bind(admin_id)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Admin not found".to_string()));
        }
        Ok(())
    }
}

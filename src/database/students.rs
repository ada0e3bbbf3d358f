//! Student credential store.
//!
//! Password hashing happens at this boundary: callers pass plaintext only on
//! create and password change, and only hashes are persisted. Uniqueness of
//! email and mobile is enforced by the database constraints, so concurrent
//! duplicate registrations resolve to one winner without any extra locking.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{DownloadRecord, Student};
use super::{is_unique_violation, StoreError};
use crate::auth::password;

const STUDENT_COLUMNS: &str = "id, name, email, mobile, password_hash, saved_papers, \
                               otp_code, otp_expires_at, created_at, updated_at";

#[derive(Debug)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

pub struct StudentStore {
    pool: PgPool,
}

impl StudentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a student, hashing the password before persistence. Email is
    /// normalized to lowercase. A unique-constraint violation on email or
    /// mobile surfaces as [`StoreError::Duplicate`].
    pub async fn create(&self, new: NewStudent) -> Result<Student, StoreError> {
        let password_hash = password::hash_password(&new.password)?;

        let query = format!(
            "INSERT INTO students (name, email, mobile, password_hash) \
             VALUES ($1, lower($2), $3, $4) \
             RETURNING {STUDENT_COLUMNS}"
        );

        sqlx::query_as::<_, Student>(&query)
            .bind(new.name.trim())
            .bind(new.email.trim())
            .bind(new.mobile.trim())
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate("Student already exists".to_string())
                } else {
                    StoreError::Sqlx(e)
                }
            })
    }

    /// Look up by login identifier, which may be either an email address or a
    /// mobile number.
    pub async fn find_by_login(&self, login_id: &str) -> Result<Option<Student>, StoreError> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE email = lower($1) OR mobile = $1"
        );

        let student = sqlx::query_as::<_, Student>(&query)
            .bind(login_id.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = lower($1)");

        let student = sqlx::query_as::<_, Student>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, StoreError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1");

        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    /// Compare a candidate against the stored hash. A mismatch is `Ok(false)`;
    /// only a corrupted stored hash is an error.
    pub fn verify_password(student: &Student, candidate: &str) -> Result<bool, StoreError> {
        Ok(password::verify_password(&student.password_hash, candidate)?)
    }

    /// Store a fresh OTP, overwriting any prior value and expiry. At most one
    /// OTP is live per student.
    pub async fn set_otp(&self, student_id: Uuid, otp: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at: DateTime<Utc> = Utc::now() + ttl;

        let result = sqlx::query(
            "UPDATE students SET otp_code = $2, otp_expires_at = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(student_id)
        .bind(otp)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Student not found".to_string()));
        }
        Ok(())
    }

    /// Single-use OTP consumption. The stored value is cleared atomically in
    /// the same statement that reads it, so a second attempt (or a concurrent
    /// one) always sees no OTP and fails. Mismatch, expiry, and absence all
    /// collapse to [`StoreError::OtpInvalid`].
    pub async fn consume_otp(&self, email: &str, candidate: &str) -> Result<Uuid, StoreError> {
        let row: Option<(Uuid, Option<String>, Option<DateTime<Utc>>)> = sqlx::query_as(
            "WITH prev AS ( \
                 SELECT id, otp_code, otp_expires_at FROM students \
                 WHERE email = lower($1) \
                 FOR UPDATE \
             ), cleared AS ( \
                 UPDATE students SET otp_code = NULL, otp_expires_at = NULL, updated_at = now() \
                 WHERE id IN (SELECT id FROM prev) \
             ) \
             SELECT id, otp_code, otp_expires_at FROM prev",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        let (student_id, stored_otp, expires_at) = row.ok_or(StoreError::OtpInvalid)?;

        match (stored_otp, expires_at) {
            (Some(stored), Some(expiry)) if stored == candidate && expiry > Utc::now() => {
                Ok(student_id)
            }
            _ => Err(StoreError::OtpInvalid),
        }
    }

    /// Password change is the only mutation that re-hashes; profile edits go
    /// through column-specific updates and never touch the hash.
    pub async fn change_password(&self, student_id: Uuid, new_password: &str) -> Result<(), StoreError> {
        let password_hash = password::hash_password(new_password)?;

        let result = sqlx::query(
            "UPDATE students SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(student_id)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Student not found".to_string()));
        }
        Ok(())
    }

    /// Add a paper reference to the student's saved set. Returns `false` when
    /// the paper was already saved (idempotent success).
    pub async fn save_paper(&self, student_id: Uuid, paper_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE students \
             SET saved_papers = array_append(saved_papers, $2), updated_at = now() \
             WHERE id = $1 AND NOT (saved_papers @> ARRAY[$2]::uuid[])",
        )
        .bind(student_id)
        .bind(paper_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // No row updated: either already saved, or no such student.
        match self.find_by_id(student_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound("Student not found".to_string())),
        }
    }

    pub async fn saved_papers(&self, student_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let papers: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT saved_papers FROM students WHERE id = $1")
                .bind(student_id)
                .fetch_optional(&self.pool)
                .await?;

        papers.ok_or_else(|| StoreError::NotFound("Student not found".to_string()))
    }

    /// Append to the download history log.
    pub async fn record_download(&self, student_id: Uuid, paper_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO student_downloads (student_id, paper_id) VALUES ($1, $2)")
            .bind(student_id)
            .bind(paper_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn download_history(&self, student_id: Uuid) -> Result<Vec<DownloadRecord>, StoreError> {
        let history = sqlx::query_as::<_, DownloadRecord>(
            "SELECT paper_id, downloaded_at FROM student_downloads \
             WHERE student_id = $1 ORDER BY downloaded_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }
}

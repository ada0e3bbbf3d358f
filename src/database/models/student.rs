use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Student principal. The password hash and transient OTP state never leave
/// the process: they are skipped on serialization so profile and auth
/// responses cannot leak them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Saved exam-paper references (many-to-many lookup; the student holds
    /// references, not the papers).
    pub saved_papers: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub otp_code: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the append-only download history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DownloadRecord {
    pub paper_id: Uuid,
    pub downloaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_serialize() {
        let student = Student {
            id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            mobile: "9999999999".to_string(),
            password_hash: "$argon2id$...".to_string(),
            saved_papers: vec![],
            otp_code: Some("123456".to_string()),
            otp_expires_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(&student).unwrap();
        assert!(body.get("password_hash").is_none());
        assert!(body.get("otp_code").is_none());
        assert!(body.get("otp_expires_at").is_none());
        assert_eq!(body["email"], "a@x.com");
    }
}

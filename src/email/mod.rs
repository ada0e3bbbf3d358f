//! Outbound email collaborator.
//!
//! Dispatch is fire-and-forget from the core's perspective: a failed send is
//! reported to the caller but never rolls back state already written (an OTP
//! stays stored even when its delivery email bounces).

use async_trait::async_trait;
use serde_json::json;

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail relay rejected message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Posts messages as JSON to a configured HTTP mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    relay_url: String,
    from_name: String,
    from_address: Option<String>,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let payload = json!({
            "from_name": self.from_name,
            "from_address": self.from_address,
            "to": to,
            "subject": subject,
            "html": body,
        });

        let response = self
            .client
            .post(&self.relay_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::Rejected(format!(
                "relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Development fallback when no relay is configured: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::info!("Mail relay not configured; would send '{}' to {}", subject, to);
        Ok(())
    }
}

/// Process-wide mailer built once from configuration.
pub fn mailer() -> &'static dyn Mailer {
    static MAILER: once_cell::sync::Lazy<Box<dyn Mailer>> = once_cell::sync::Lazy::new(from_config);
    MAILER.as_ref()
}

/// Build the mailer implied by configuration.
pub fn from_config() -> Box<dyn Mailer> {
    let email = &config::config().email;
    match &email.relay_url {
        Some(relay_url) => Box::new(HttpMailer {
            client: reqwest::Client::new(),
            relay_url: relay_url.clone(),
            from_name: email.from_name.clone(),
            from_address: email.from_address.clone(),
        }),
        None => Box::new(LogMailer),
    }
}

/// Compose and dispatch the OTP login email.
pub async fn send_otp_email(
    mailer: &dyn Mailer,
    to: &str,
    name: &str,
    otp: &str,
    ttl_minutes: i64,
) -> Result<(), MailError> {
    let from_name = &config::config().email.from_name;
    let subject = format!("Your Login OTP - {from_name}");
    let body = otp_body(name, otp, ttl_minutes, from_name);
    mailer.send(to, &subject, &body).await
}

fn otp_body(name: &str, otp: &str, ttl_minutes: i64, from_name: &str) -> String {
    let name = if name.is_empty() { "Student" } else { name };
    format!(
        "<p>Hello <b>{name}</b>,</p>\
         <p>Your OTP for login is:</p>\
         <h2>{otp}</h2>\
         <p>This OTP is valid for <b>{ttl_minutes} minutes</b>.</p>\
         <p>If you did not request this, please ignore.</p>\
         <p>Regards,<br><b>{from_name}</b></p>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_body_mentions_code_and_ttl() {
        let body = otp_body("A", "123456", 5, "Knowledge Hunt");
        assert!(body.contains("123456"));
        assert!(body.contains("5 minutes"));
        assert!(body.contains("Hello <b>A</b>"));
    }

    #[test]
    fn otp_body_falls_back_to_generic_greeting() {
        let body = otp_body("", "654321", 5, "Knowledge Hunt");
        assert!(body.contains("Hello <b>Student</b>"));
    }
}

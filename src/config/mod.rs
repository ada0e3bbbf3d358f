use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub otp: OtpConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC secret for session tokens. Empty secret is a fatal startup
    /// condition, checked by [`AppConfig::validate`].
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    /// Bootstrap admin identity. When both email and password are present the
    /// startup routine guarantees one reachable admin login.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// When true, admin login is restricted to `admin_email` and any other
    /// address is rejected before credential comparison.
    pub pin_admin_login: bool,
    /// Surface internal error detail in 500 bodies (development only).
    pub expose_internal_errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// HTTP mail relay endpoint. When unset, outgoing mail is logged instead
    /// of dispatched (development fallback).
    pub relay_url: Option<String>,
    pub from_name: String,
    pub from_address: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_DAYS") {
            self.security.jwt_expiry_days = v.parse().unwrap_or(self.security.jwt_expiry_days);
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            if !v.trim().is_empty() {
                self.security.admin_email = Some(v.trim().to_lowercase());
            }
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            if !v.is_empty() {
                self.security.admin_password = Some(v);
            }
        }
        if let Ok(v) = env::var("ADMIN_LOGIN_PINNED") {
            self.security.pin_admin_login = v.parse().unwrap_or(self.security.pin_admin_login);
        }

        // OTP overrides
        if let Ok(v) = env::var("OTP_TTL_MINUTES") {
            self.otp.ttl_minutes = v.parse().unwrap_or(self.otp.ttl_minutes);
        }

        // Email overrides
        if let Ok(v) = env::var("MAIL_RELAY_URL") {
            if !v.trim().is_empty() {
                self.email.relay_url = Some(v.trim().to_string());
            }
        }
        if let Ok(v) = env::var("MAIL_FROM_NAME") {
            self.email.from_name = v;
        }
        if let Ok(v) = env::var("MAIL_FROM_ADDRESS") {
            self.email.from_address = Some(v);
        }

        self
    }

    /// Startup validation. A missing signing secret makes every issued token
    /// forgeable, so refuse to boot without one.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET is required and must be non-empty".to_string());
        }
        if self.security.jwt_expiry_days <= 0 {
            return Err("JWT_EXPIRES_DAYS must be positive".to_string());
        }
        if self.otp.ttl_minutes <= 0 {
            return Err("OTP_TTL_MINUTES must be positive".to_string());
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_days: 7,
                admin_email: None,
                admin_password: None,
                pin_admin_login: false,
                expose_internal_errors: true,
            },
            otp: OtpConfig { ttl_minutes: 5 },
            email: EmailConfig {
                relay_url: None,
                from_name: "Knowledge Hunt".to_string(),
                from_address: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_days: 7,
                admin_email: None,
                admin_password: None,
                pin_admin_login: true,
                expose_internal_errors: false,
            },
            otp: OtpConfig { ttl_minutes: 5 },
            email: EmailConfig {
                relay_url: None,
                from_name: "Knowledge Hunt".to_string(),
                from_address: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

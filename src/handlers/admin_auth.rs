//! Admin authentication: password login (optionally pinned to the configured
//! admin email), profile, the env-based password reset, and the idempotent
//! startup bootstrap.

use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{self, Role};
use crate::config;
use crate::database::admins::AdminStore;
use crate::database::{self, StoreError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentAdmin};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/admin/auth/login
///
/// When login pinning is enabled, any email other than the configured admin
/// email is rejected with 403 before credentials are even compared.
pub async fn login(Json(payload): Json<AdminLoginRequest>) -> ApiResult<Value> {
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || payload.password.is_empty() {
        let mut field_errors = HashMap::new();
        if email.is_empty() {
            field_errors.insert("email".to_string(), "Valid email required".to_string());
        }
        if payload.password.is_empty() {
            field_errors.insert("password".to_string(), "Password required".to_string());
        }
        return Err(ApiError::validation_error("Email and password required", Some(field_errors)));
    }

    let security = &config::config().security;
    if security.pin_admin_login {
        match &security.admin_email {
            Some(pinned) if *pinned == email => {}
            _ => {
                tracing::warn!("Admin login attempt for non-pinned email rejected");
                return Err(ApiError::forbidden("Access denied"));
            }
        }
    }

    let pool = database::pool().await?;
    let admin = AdminStore::new(pool)
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !AdminStore::verify_password(&admin, &payload.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(admin.id, Role::Admin)?;

    Ok(ApiResponse::success(json!({ "token": token })))
}

/// GET /api/admin/auth/profile
pub async fn profile(Extension(CurrentAdmin(admin)): Extension<CurrentAdmin>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "profile": admin })))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/admin/auth/forgot-password
///
/// Environment-based reset: only the configured admin email may ask, and the
/// password is reset to the configured bootstrap password rather than a
/// caller-supplied one. No token or email round trip is involved.
pub async fn forgot_password(Json(payload): Json<ForgotPasswordRequest>) -> ApiResult<Value> {
    let email = payload.email.trim().to_lowercase();

    let security = &config::config().security;
    match &security.admin_email {
        Some(pinned) if *pinned == email => {}
        _ => {
            tracing::warn!("Password reset attempt for non-admin email rejected");
            return Err(ApiError::forbidden("Unauthorized email"));
        }
    }

    let Some(default_password) = &security.admin_password else {
        return Err(ApiError::internal_server_error("ADMIN_PASSWORD not configured"));
    };

    let pool = database::pool().await?;
    let store = AdminStore::new(pool);
    let admin = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin not found"))?;

    store.set_password(admin.id, default_password).await?;
    tracing::info!("Admin password reset to the configured default: {}", email);

    Ok(ApiResponse::success(json!({
        "message": "Password reset to default admin password"
    })))
}

/// Idempotent startup bootstrap: create the configured admin if absent.
///
/// Missing configuration is logged but never fails the process; once
/// configuration is present this guarantees exactly one reachable admin login.
pub async fn initialize_admin() -> Result<(), StoreError> {
    let security = &config::config().security;

    let (email, password) = match (&security.admin_email, &security.admin_password) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD missing; skipping admin bootstrap");
            return Ok(());
        }
    };

    let pool = database::pool().await?;
    let store = AdminStore::new(pool);

    if store.find_by_email(email).await?.is_some() {
        tracing::info!("Admin already exists: {}", email);
        return Ok(());
    }

    match store.create(email, password).await {
        Ok(admin) => {
            tracing::info!("Default admin created: {} ({})", email, admin.id);
            Ok(())
        }
        // Lost a race with a concurrent boot; the admin exists either way.
        Err(StoreError::Duplicate(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

//! Student authentication handlers: registration, password login by email or
//! mobile, OTP login, and profile.

use axum::{Extension, Json};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{self, Role};
use crate::config;
use crate::database;
use crate::database::students::{NewStudent, StudentStore};
use crate::email;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentStudent};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "loginId", default)]
    pub login_id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// POST /api/student/auth/register
///
/// Validates input, creates the student (uniqueness enforced by the store),
/// and responds 201 with a session token plus the public profile.
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Value> {
    let field_errors = validate_register(&payload);
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(field_errors)));
    }

    let pool = database::pool().await?;
    let student = StudentStore::new(pool)
        .create(NewStudent {
            name: payload.name,
            email: payload.email,
            mobile: payload.mobile,
            password: payload.password,
        })
        .await?;

    let token = auth::issue_token(student.id, Role::Student)?;
    tracing::info!("Registered student {}", student.id);

    Ok(ApiResponse::created(json!({
        "token": token,
        "user": student,
    })))
}

/// POST /api/student/auth/login
///
/// The identifier may be an email address or a mobile number. Unknown
/// identifier and wrong password produce identical 401 responses.
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    if payload.login_id.trim().is_empty() || payload.password.is_empty() {
        let mut field_errors = HashMap::new();
        if payload.login_id.trim().is_empty() {
            field_errors.insert("loginId".to_string(), "Email or mobile is required".to_string());
        }
        if payload.password.is_empty() {
            field_errors.insert("password".to_string(), "Password is required".to_string());
        }
        return Err(ApiError::validation_error("Validation failed", Some(field_errors)));
    }

    let pool = database::pool().await?;
    let store = StudentStore::new(pool);

    let student = store
        .find_by_login(&payload.login_id)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !StudentStore::verify_password(&student, &payload.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(student.id, Role::Student)?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": student,
    })))
}

/// POST /api/student/auth/send-otp
///
/// Issues a fresh 6-digit OTP (overwriting any prior one) and dispatches it by
/// email. A failed dispatch is reported but does not roll back the stored OTP.
pub async fn send_otp(Json(payload): Json<SendOtpRequest>) -> ApiResult<Value> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("Email required"));
    }

    let pool = database::pool().await?;
    let store = StudentStore::new(pool);

    let student = store
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::not_found("Email not registered"))?;

    let otp = generate_otp();
    let ttl_minutes = config::config().otp.ttl_minutes;
    store
        .set_otp(student.id, &otp, chrono::Duration::minutes(ttl_minutes))
        .await?;

    email::send_otp_email(email::mailer(), &student.email, &student.name, &otp, ttl_minutes)
        .await
        .map_err(|e| {
            tracing::error!("OTP email dispatch failed for student {}: {}", student.id, e);
            ApiError::bad_gateway("Failed to send OTP")
        })?;

    Ok(ApiResponse::success(json!({
        "message": "OTP sent to email",
    })))
}

/// POST /api/student/auth/verify-otp
///
/// Consumes the OTP (single use, cleared whatever the outcome) and issues a
/// session token. Mismatch and expiry are not distinguished in the response.
pub async fn verify_otp(Json(payload): Json<VerifyOtpRequest>) -> ApiResult<Value> {
    if payload.email.trim().is_empty() || payload.otp.trim().is_empty() {
        return Err(ApiError::bad_request("Email and OTP required"));
    }

    let pool = database::pool().await?;
    let store = StudentStore::new(pool);

    let student_id = store.consume_otp(&payload.email, payload.otp.trim()).await?;

    let student = store
        .find_by_id(student_id)
        .await?
        .ok_or(ApiError::OtpInvalid)?;

    let token = auth::issue_token(student.id, Role::Student)?;

    Ok(ApiResponse::success(json!({
        "message": "Login successful",
        "token": token,
        "user": student,
    })))
}

/// GET /api/student/auth/profile
pub async fn profile(Extension(CurrentStudent(student)): Extension<CurrentStudent>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "profile": student,
    })))
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn validate_register(payload: &RegisterRequest) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if payload.name.trim().len() < 2 {
        errors.insert("name".to_string(), "Name must be at least 2 characters".to_string());
    }
    if !is_plausible_email(payload.email.trim()) {
        errors.insert("email".to_string(), "Please enter a valid email".to_string());
    }
    let mobile = payload.mobile.trim();
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        errors.insert("mobile".to_string(), "Mobile number must be 10 digits".to_string());
    }
    if payload.password.len() < 6 {
        errors.insert(
            "password".to_string(),
            "Password must be at least 6 characters".to_string(),
        );
    }

    errors
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

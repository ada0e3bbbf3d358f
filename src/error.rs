// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every expected failure kind maps onto a stable `success:false` JSON
/// envelope; unexpected internals are logged and collapsed to a generic 500 so
/// nothing leaks to clients.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    /// Email or mobile already registered. Deliberately non-specific about
    /// which field collided.
    DuplicateCredential(String),
    /// OTP missing, mismatched, or expired - the three causes are never
    /// distinguished in the response.
    OtpInvalid,

    // 401 Unauthorized
    Unauthenticated(String),
    /// Login failure. Identical body for unknown identifier and wrong
    /// password to prevent account enumeration.
    InvalidCredentials,

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external collaborators: mail relay)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::DuplicateCredential(_) => 400,
            ApiError::OtpInvalid => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::InvalidCredentials => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::DuplicateCredential(msg) => msg,
            ApiError::OtpInvalid => "Invalid or expired OTP",
            ApiError::Unauthenticated(msg) => msg,
            ApiError::InvalidCredentials => "Invalid credentials",
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::DuplicateCredential(_) => "DUPLICATE_CREDENTIAL",
            ApiError::OtpInvalid => "OTP_INVALID",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError {
                message,
                field_errors,
            } => {
                let mut response = json!({
                    "success": false,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "success": false,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn duplicate_credential(message: impl Into<String>) -> Self {
        ApiError::DuplicateCredential(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert store errors to ApiError
impl From<crate::database::StoreError> for ApiError {
    fn from(err: crate::database::StoreError) -> Self {
        match err {
            crate::database::StoreError::Duplicate(msg) => ApiError::duplicate_credential(msg),
            crate::database::StoreError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::StoreError::OtpInvalid => ApiError::OtpInvalid,
            crate::database::StoreError::CorruptHash(msg) => {
                tracing::error!("Corrupt stored credential: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            crate::database::StoreError::Config(what) => {
                tracing::error!("Missing configuration: {}", what);
                ApiError::service_unavailable("Service temporarily unavailable")
            }
            crate::database::StoreError::Migrate(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::database::StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", sqlx_err);
                if crate::config::config().security.expose_internal_errors {
                    ApiError::internal_server_error(sqlx_err.to_string())
                } else {
                    ApiError::internal_server_error("Internal server error")
                }
            }
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        // Expired and invalid tokens differ only for observability; callers
        // see the same unauthenticated outcome.
        match err {
            crate::auth::TokenError::Expired => {
                tracing::debug!("Rejected expired session token");
                ApiError::unauthenticated("Authentication failed")
            }
            crate::auth::TokenError::Invalid(reason) => {
                tracing::debug!("Rejected invalid session token: {}", reason);
                ApiError::unauthenticated("Authentication failed")
            }
            crate::auth::TokenError::MissingSecret => {
                tracing::error!("Token operation attempted without configured secret");
                ApiError::internal_server_error("Internal server error")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::validation_error("bad", None).status_code(), 400);
        assert_eq!(ApiError::duplicate_credential("dup").status_code(), 400);
        assert_eq!(ApiError::OtpInvalid.status_code(), 400);
        assert_eq!(ApiError::InvalidCredentials.status_code(), 401);
        assert_eq!(ApiError::unauthenticated("no").status_code(), 401);
        assert_eq!(ApiError::forbidden("no").status_code(), 403);
        assert_eq!(ApiError::not_found("gone").status_code(), 404);
        assert_eq!(ApiError::internal_server_error("boom").status_code(), 500);
    }

    #[test]
    fn envelope_is_stable() {
        let body = ApiError::InvalidCredentials.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[test]
    fn validation_error_carries_field_errors() {
        let mut fields = HashMap::new();
        fields.insert("mobile".to_string(), "Mobile number must be 10 digits".to_string());
        let body = ApiError::validation_error("Validation failed", Some(fields)).to_json();
        assert_eq!(body["errors"]["mobile"], "Mobile number must be 10 digits");
    }

    #[test]
    fn otp_failures_are_indistinguishable() {
        // Mismatch and expiry must produce identical bodies
        assert_eq!(ApiError::OtpInvalid.to_json(), ApiError::OtpInvalid.to_json());
    }
}

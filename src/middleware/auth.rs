//! Role-gated authorization middleware.
//!
//! Pipeline per protected request: extract the bearer token, verify signature
//! and expiry, enforce the role the route requires, then resolve the principal
//! from the credential store so a token issued before an account was removed
//! cannot get through. The resolved principal (sans credentials) is the only
//! state contributed to downstream handlers.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Claims, Role};
use crate::database::admins::AdminStore;
use crate::database::models::{Admin, Student};
use crate::database::students::StudentStore;
use crate::error::ApiError;

/// Student principal resolved for the current request.
#[derive(Clone, Debug)]
pub struct CurrentStudent(pub Student);

/// Admin principal resolved for the current request.
#[derive(Clone, Debug)]
pub struct CurrentAdmin(pub Admin);

pub async fn student_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&headers, Role::Student)?;

    let pool = crate::database::pool().await?;
    let student = StudentStore::new(pool)
        .find_by_id(claims.id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token for missing student {} rejected", claims.id);
            ApiError::unauthenticated("Invalid token")
        })?;

    request.extensions_mut().insert(CurrentStudent(student));
    Ok(next.run(request).await)
}

pub async fn admin_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&headers, Role::Admin)?;

    let pool = crate::database::pool().await?;
    let admin = AdminStore::new(pool)
        .find_by_id(claims.id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Token for missing admin {} rejected", claims.id);
            ApiError::unauthenticated("Invalid token")
        })?;

    request.extensions_mut().insert(CurrentAdmin(admin));
    Ok(next.run(request).await)
}

/// Verify the bearer token and enforce the required role. Wrong role is 403;
/// everything else that goes wrong here is 401.
fn authenticate(headers: &HeaderMap, required_role: Role) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| ApiError::unauthenticated("No token provided"))?;

    let claims = auth::verify_token(&token)?;

    if claims.role != required_role {
        tracing::warn!(
            "Role mismatch: token role '{}' on a {}-only route",
            claims.role,
            required_role
        );
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(claims)
}

/// Extract the token from a `Authorization: Bearer <token>` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn non_bearer_scheme_yields_none() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert!(extract_bearer_token(&headers).is_none());
    }

    #[test]
    fn empty_bearer_token_yields_none() {
        let headers = headers_with_auth("Bearer   ");
        assert!(extract_bearer_token(&headers).is_none());
    }
}

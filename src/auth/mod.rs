use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

pub mod password;

/// Principal role encoded in the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Session token claims. Self-contained: nothing is persisted server-side and
/// there is no revocation list - compromise mitigation is the short expiry
/// plus out-of-band secret rotation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(id: Uuid, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Mint a signed session token for a principal using the configured secret
/// and expiry.
pub fn issue_token(id: Uuid, role: Role) -> Result<String, TokenError> {
    let security = &config::config().security;
    let ttl = Duration::days(security.jwt_expiry_days);
    encode_claims(&Claims::new(id, role, ttl), &security.jwt_secret)
}

/// Verify signature and expiry, returning the claims on success.
pub fn verify_token(token: &str) -> Result<Claims, TokenError> {
    decode_claims(token, &config::config().security.jwt_secret)
}

fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| TokenError::Invalid(e.to_string()))
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    // No clock leeway: a token past its exp claim is expired, full stop.
    validation.leeway = 0;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn roundtrip_preserves_id_and_role() {
        let id = Uuid::new_v4();
        let token = encode_claims(&Claims::new(id, Role::Student, Duration::days(7)), SECRET)
            .expect("encode");
        let claims = decode_claims(&token, SECRET).expect("decode");
        assert_eq!(claims.id, id);
        assert_eq!(claims.role, Role::Student);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let id = Uuid::new_v4();
        let expired = Claims {
            id,
            role: Role::Admin,
            iat: Utc::now().timestamp() - 120,
            exp: Utc::now().timestamp() - 60,
        };
        let token = encode_claims(&expired, SECRET).expect("encode");
        assert!(matches!(decode_claims(&token, SECRET), Err(TokenError::Expired)));
    }

    #[test]
    fn token_valid_until_expiry_instant() {
        let id = Uuid::new_v4();
        let token = encode_claims(&Claims::new(id, Role::Student, Duration::seconds(60)), SECRET)
            .expect("encode");
        // Well within the window this must verify
        assert!(decode_claims(&token, SECRET).is_ok());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = encode_claims(
            &Claims::new(Uuid::new_v4(), Role::Student, Duration::days(1)),
            SECRET,
        )
        .expect("encode");
        assert!(matches!(
            decode_claims(&token, "other-secret"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn tampered_token_is_invalid() {
        let mut token = encode_claims(
            &Claims::new(Uuid::new_v4(), Role::Student, Duration::days(1)),
            SECRET,
        )
        .expect("encode");
        token.push('x');
        assert!(matches!(decode_claims(&token, SECRET), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn empty_secret_refuses_to_sign() {
        let claims = Claims::new(Uuid::new_v4(), Role::Admin, Duration::days(1));
        assert!(matches!(
            encode_claims(&claims, ""),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}

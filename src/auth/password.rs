//! Password hashing at the credential-store boundary.
//!
//! Callers hand plaintext in exactly once (create / password change) and only
//! ever get hashes back out. Argon2id with a per-hash random salt.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is corrupt: {0}")]
    Corrupt(String),
}

pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Compare a candidate against a stored hash. A plain mismatch is `Ok(false)`,
/// never an error; only an unparseable stored hash fails.
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordError::Corrupt(e.to_string()))?;

    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Corrupt(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("secret1").expect("hash");
        assert!(verify_password(&hash, "secret1").expect("verify"));
        assert!(!verify_password(&hash, "secret2").expect("verify"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("secret1").expect("hash");
        let b = hash_password("secret1").expect("hash");
        assert_ne!(a, b);
        // Both still verify against the original plaintext
        assert!(verify_password(&a, "secret1").unwrap());
        assert!(verify_password(&b, "secret1").unwrap());
    }

    #[test]
    fn plaintext_never_stored_verbatim() {
        let hash = hash_password("secret1").expect("hash");
        assert!(!hash.contains("secret1"));
    }

    #[test]
    fn corrupt_hash_is_an_error_not_a_mismatch() {
        assert!(matches!(
            verify_password("not-a-phc-string", "anything"),
            Err(PasswordError::Corrupt(_))
        ));
    }
}

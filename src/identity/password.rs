//! Password hashing and verification (Argon2, PHC strings).
//!
//! Credential records may be configured with a plaintext password; the store hashes it
//! once at construction so that every comparison goes through Argon2.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use super::credentials::CredentialRecord;
use crate::error::AuthError;

/// A stored credential secret. Only PHC hashes are kept in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredPassword(String);

impl StoredPassword {
    pub fn from_phc(phc: impl Into<String>) -> Result<Self, AuthError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self(phc))
    }

    pub fn from_plaintext(plain: &str) -> Result<Self, AuthError> {
        Ok(Self(hash_password(plain)?))
    }

    pub fn as_phc(&self) -> &str { &self.0 }
}

impl std::fmt::Debug for StoredPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoredPassword(<redacted>)")
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_phc(phc: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(phc) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Check a submitted plaintext against a record. A record without a password never matches.
pub fn verify(candidate: &str, record: &CredentialRecord) -> bool {
    match record.password() {
        Some(stored) => verify_phc(stored.as_phc(), candidate),
        None => false,
    }
}

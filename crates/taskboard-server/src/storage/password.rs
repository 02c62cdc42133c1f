//! Password hashing
//!
//! Argon2 with a random salt per user. The stored value is the PHC string,
//! which carries the salt and parameters needed to re-derive the digest.

use crate::error::StoreError;
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Re-derive the digest of `password` with the stored salt and compare.
///
/// `Ok(false)` is a mismatch; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, StoreError> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| StoreError::PasswordHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StoreError::PasswordHash(e.to_string())),
    }
}

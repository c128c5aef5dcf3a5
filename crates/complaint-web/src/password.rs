//! Password hashing with Argon2id.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{ApiError, Result};

const SALT_SIZE: usize = 16; // 128 bits

/// Hash a password into a PHC string (algorithm, parameters, salt and hash).
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let salt_string = SaltString::encode_b64(&salt)
        .map_err(|e| ApiError::Internal(format!("Salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Stored password hash is malformed");
            false
        }
    }
}

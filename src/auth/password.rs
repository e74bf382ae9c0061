//! Staff credentials: argon2id hashing and the password policy
//!
//! Hashes are stored as PHC strings in `staff_users.password_hash`, so the
//! salt and cost parameters travel with each account.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::GatewayError;

/// Shortest password accepted for a new staff account
pub const MIN_PASSWORD_LEN: usize = 10;

/// Check a new staff password against the policy
pub fn check_password_policy(username: &str, password: &str) -> Result<(), GatewayError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GatewayError::Auth(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if !username.is_empty() && password.to_lowercase().contains(&username.to_lowercase()) {
        return Err(GatewayError::Auth("password must not contain the username".into()));
    }
    Ok(())
}

/// Hash a staff password for storage
pub fn hash_password(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GatewayError::Auth(format!("Failed to hash password: {e}")))?;
    Ok(phc.to_string())
}

/// True when `password` matches the stored PHC hash.
///
/// A malformed stored hash is an error rather than a mismatch, so a corrupt
/// account is visible in the logs.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, GatewayError> {
    let phc = PasswordHash::new(stored_hash)
        .map_err(|e| GatewayError::Auth(format!("Invalid password hash format: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(GatewayError::Auth(format!("Password verification failed: {e}"))),
    }
}

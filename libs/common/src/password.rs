//! Password hashing with argon2
//!
//! Hashes are PHC strings (algorithm, parameters, salt and digest in one
//! column). Both operations are CPU bound; async callers should go through
//! the `*_blocking` variants so the runtime threads stay free.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use std::sync::OnceLock;

use crate::error::{DomainError, DomainResult};

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Hash verified when no account matches, so unknown emails cost as much as
/// wrong passwords
fn placeholder_hash() -> &'static str {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        hash_password("placeholder-credential-0").unwrap_or_else(|e| {
            tracing::error!("Failed to hash the placeholder credential: {}", e);
            String::new()
        })
    })
}

/// Verify a sign-in attempt. Without a stored hash the password is still run
/// through argon2 against a placeholder and the attempt fails.
pub fn verify_credentials(stored_hash: Option<&str>, password: &str) -> bool {
    match stored_hash {
        Some(hash) => verify_password(hash, password),
        None => {
            verify_password(placeholder_hash(), password);
            false
        }
    }
}

pub async fn hash_password_blocking(password: String) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DomainError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| DomainError::Internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password_blocking(stored_hash: Option<String>, password: String) -> bool {
    tokio::task::spawn_blocking(move || verify_credentials(stored_hash.as_deref(), &password))
        .await
        .unwrap_or(false)
}

//! Argon2id credential helpers for the approval re-authentication factor.
//!
//! Approval is a high-trust action, so the approver must re-enter their
//! password even with a valid session. Hashes use the Argon2id variant
//! with a random salt and are stored in PHC string format, so algorithm
//! parameters and salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::types::DbId;

/// Hash a plaintext password with Argon2id and a random salt.
///
/// Returns the PHC-formatted hash string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC-formatted hash.
///
/// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch; any other
/// outcome (corrupt hash, unsupported parameters) is an error.
pub fn verify_password(
    candidate: &str,
    stored_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Validate that a password meets the minimum length for provisioning.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.len() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    Ok(())
}

/// External collaborator: re-authenticates an actor by password.
///
/// Implementations must fail closed: an unknown or deactivated actor
/// verifies as `false`, never as an error the caller might misread as
/// a transient failure.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_password(
        &self,
        actor_id: DbId,
        candidate: &str,
    ) -> Result<bool, WorkflowError>;
}

//! Password hashing and verification.
//!
//! DESIGN
//! ======
//! bcrypt with a random per-call salt. Hashing is deliberately slow, so the
//! async entry points offload to `spawn_blocking` and keep the worker
//! threads free. Verification of a malformed digest is `false`, never an
//! error: the caller only ever learns "matched or not".

use bcrypt::DEFAULT_COST;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task aborted")]
    Aborted,
}

pub(crate) fn hash_with_cost(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

pub(crate) fn verify_sync(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

/// Hash a plaintext password at the default cost.
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task is aborted.
pub async fn hash(plaintext: &str) -> Result<String, PasswordError> {
    let plaintext = plaintext.to_owned();
    tokio::task::spawn_blocking(move || hash_with_cost(&plaintext, DEFAULT_COST))
        .await
        .map_err(|_| PasswordError::Aborted)?
        .map_err(PasswordError::from)
}

/// Check a plaintext password against a stored digest. Malformed digests
/// and aborted tasks verify as `false`.
pub async fn verify(plaintext: &str, digest: &str) -> bool {
    let plaintext = plaintext.to_owned();
    let digest = digest.to_owned();
    tokio::task::spawn_blocking(move || verify_sync(&plaintext, &digest))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;

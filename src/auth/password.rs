use bcrypt::DEFAULT_COST;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("could not hash password: {0}")]
    HashingFailed(#[source] bcrypt::BcryptError),
    #[error("stored hash is unusable: {0}")]
    VerificationFailed(#[source] bcrypt::BcryptError),
}

/// bcrypt salé. Le clair ne sort jamais de ces deux fonctions.
pub struct PasswordManager;

impl PasswordManager {
    pub fn hash(plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, DEFAULT_COST).map_err(PasswordError::HashingFailed)
    }

    /// `Ok(false)` sur simple mismatch; `Err` seulement si le hash stocké est illisible.
    pub fn verify(plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        bcrypt::verify(plaintext, stored_hash).map_err(PasswordError::VerificationFailed)
    }
}

use std::sync::Arc;

use crate::auth::password::PasswordManager;
use crate::auth::validation::validate_email;
use crate::db::models::user::User;
use crate::db::store::UserStore;
use crate::error::AppError;

/// Vérification email + mot de passe contre le slot password du compte.
pub struct LocalVerifier {
    store: Arc<dyn UserStore>,
}

impl LocalVerifier {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub fn verify_local(&self, email: &str, plaintext_password: &str) -> Result<User, AppError> {
        validate_email(email)?;

        let user = self
            .store
            .find_by_email(email)?
            .ok_or_else(|| AppError::not_found("No account for this email"))?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::not_found("No password set for this account"));
        };

        if !PasswordManager::verify(plaintext_password, password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::BadCredentials);
        }

        Ok(user)
    }
}

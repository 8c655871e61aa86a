use validator::ValidateEmail;

use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Vérifie qu'un email est présent et bien formé.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if !email.validate_email() {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(())
}

/// Règles d'un nouveau mot de passe: confirmation identique et longueur minimale.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), AppError> {
    if password.is_empty() || confirm.is_empty() {
        return Err(AppError::validation("Password and confirmation are required"));
    }
    if password != confirm {
        return Err(AppError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

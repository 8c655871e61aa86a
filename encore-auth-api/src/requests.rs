use serde::{Deserialize, Serialize};

// -------- REQUEST DTOs --------
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String, // Plain text
    pub confirm: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LocalLoginRequest {
    pub email: String,
    pub password: String, // Plain text
}

/// Claim normalisé livré par un fournisseur OAuth (Google, Facebook)
/// une fois son propre handshake terminé.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProviderClaim {
    pub email: String,
    pub profile_id: String,
    pub access_token: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub password: String, // Plain text
    pub confirm: String,
}

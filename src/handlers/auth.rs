// src/handlers/auth.rs

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use encore_auth_api::{
    ForgotPasswordRequest, LocalLoginRequest, MessageResponse, ProviderClaim, RegisterRequest,
    ResetPasswordRequest, SignInResponse,
};

use crate::app::AppState;
use crate::auth::extractors::ProviderGuard;
use crate::auth::services::Provider;
use crate::error::AppError;
use crate::response::AppResponse;

/// POST /auth/register
/// Inscription locale (ou ajout d'un mot de passe à un compte Google/Facebook)
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<AppResponse<SignInResponse>, AppError> {
    let Json(payload) = payload?;
    let response = state.auth.register(payload)?;
    Ok(AppResponse::created(response).no_store())
}

/// POST /auth/local
/// Connexion email + mot de passe
pub async fn local_login(
    State(state): State<AppState>,
    payload: Result<Json<LocalLoginRequest>, JsonRejection>,
) -> Result<AppResponse<SignInResponse>, AppError> {
    let Json(payload) = payload?;
    let response = state.auth.login(&payload)?;
    Ok(AppResponse::ok(response).no_store())
}

/// POST /auth/google/callback
pub async fn google_callback(
    _guard: ProviderGuard,
    State(state): State<AppState>,
    payload: Result<Json<ProviderClaim>, JsonRejection>,
) -> Result<AppResponse<SignInResponse>, AppError> {
    provider_sign_in(&state, Provider::Google, payload)
}

/// POST /auth/facebook/callback
pub async fn facebook_callback(
    _guard: ProviderGuard,
    State(state): State<AppState>,
    payload: Result<Json<ProviderClaim>, JsonRejection>,
) -> Result<AppResponse<SignInResponse>, AppError> {
    provider_sign_in(&state, Provider::Facebook, payload)
}

fn provider_sign_in(
    state: &AppState,
    provider: Provider,
    payload: Result<Json<ProviderClaim>, JsonRejection>,
) -> Result<AppResponse<SignInResponse>, AppError> {
    let Json(claim) = payload?;
    let response = state.auth.sign_in_with_provider(provider, claim)?;
    Ok(AppResponse::ok(response).no_store())
}

/// POST /auth/forgot
/// Émet un jeton de réinitialisation; le lien part par le mailer, jamais dans la réponse
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<AppResponse<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    let ticket = state.auth.request_password_reset(&payload.email)?;
    Ok(AppResponse::accepted(MessageResponse::new(format!(
        "A password reset link has been sent to {}",
        ticket.email
    ))))
}

/// GET /auth/reset/{token}
/// Vérifie qu'un jeton est encore utilisable
pub async fn check_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<AppResponse<MessageResponse>, AppError> {
    state.auth.check_reset_token(&token)?;
    Ok(AppResponse::ok(MessageResponse::new("Reset token is valid")))
}

/// POST /auth/reset/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<AppResponse<MessageResponse>, AppError> {
    let Json(payload) = payload?;
    let user = state.auth.reset_password(&token, &payload)?;
    Ok(AppResponse::ok(MessageResponse::new(format!(
        "Password for {} has been changed, please sign in again",
        user.email
    ))))
}

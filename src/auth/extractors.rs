use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use subtle::ConstantTimeEq;

use crate::app::AppState;
use crate::auth::jwt::Claims;
use crate::error::AppError;

pub const PROVIDER_SECRET_HEADER: &str = "x-provider-secret";

/// Extracteur d'authentification pour les routes protégées.
/// Valide `Authorization: Bearer <JWT>` et expose les claims utiles.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub sub: uuid::Uuid,
}

impl From<Claims> for AuthClaims {
    fn from(c: Claims) -> Self {
        Self { sub: c.sub }
    }
}

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::InvalidTokenFormat)?
            .to_str()
            .map_err(|_| AppError::InvalidTokenFormat)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::InvalidTokenFormat)?;

        let claims = state
            .auth
            .jwt_manager()
            .verify_token(token)
            .map_err(|_| AppError::unauthorized("Invalid token"))?;

        Ok(AuthClaims::from(claims))
    }
}

/// Garde des callbacks fournisseurs: seul le collaborateur OAuth, qui connaît
/// le secret partagé, peut livrer un claim.
#[derive(Debug, Clone, Copy)]
pub struct ProviderGuard;

impl FromRequestParts<AppState> for ProviderGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.provider_secret.as_bytes();
        if expected.is_empty() {
            tracing::warn!("Provider callback refused: PROVIDER_SECRET is not configured");
            return Err(AppError::unauthorized("Provider callbacks are disabled"));
        }

        let presented = parts
            .headers
            .get(PROVIDER_SECRET_HEADER)
            .map(|v| v.as_bytes())
            .unwrap_or_default();

        if bool::from(presented.ct_eq(expected)) {
            Ok(ProviderGuard)
        } else {
            Err(AppError::unauthorized("Invalid provider secret"))
        }
    }
}

use axum::extract::State;
use encore_auth_api::UserResponse;

use crate::app::AppState;
use crate::auth::extractors::AuthClaims;
use crate::error::AppError;
use crate::response::AppResponse;

/// GET /users/me
/// Récupère le profil de l'utilisateur courant
pub async fn get_current_user(
    claims: AuthClaims,
    State(state): State<AppState>,
) -> Result<AppResponse<UserResponse>, AppError> {
    let user = state.auth.current_user(claims.sub)?;
    Ok(AppResponse::ok(user))
}

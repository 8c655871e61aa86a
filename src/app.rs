// src/app.rs

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::services::AuthService;
use crate::handlers::auth::{
    check_reset_token, facebook_callback, forgot_password, google_callback, local_login,
    register, reset_password,
};
use crate::handlers::health::health;
use crate::handlers::user::get_current_user;

/// État partagé par tous les handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub provider_secret: Arc<str>,
}

impl AppState {
    pub fn new(auth: AuthService, provider_secret: &str) -> Self {
        Self {
            auth: Arc::new(auth),
            provider_secret: Arc::from(provider_secret),
        }
    }
}

/// Configure les routes d'authentification
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/local", post(local_login))
        .route("/google/callback", post(google_callback))
        .route("/facebook/callback", post(facebook_callback))
        .route("/forgot", post(forgot_password))
        .route("/reset/{token}", get(check_reset_token).post(reset_password))
}

/// Configure les routes utilisateur (Bearer token requis)
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_current_user))
}

/// Construit l'application complète
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .with_state(state)
        // Middleware global de tracing
        .layer(TraceLayer::new_for_http())
}

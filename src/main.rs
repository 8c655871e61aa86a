mod app;
mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod response;

use std::sync::Arc;

use app::{AppState, build_router};
use auth::jwt::JwtManager;
use auth::mailer::LogMailer;
use auth::services::{AuthService, ResetSettings};
use config::{Config, StoreBackend};
use db::memory::InMemoryUserStore;
use db::repositories::user_repository::UserRepository;
use db::store::UserStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Si RUST_LOG n'est pas défini, utiliser ces règles par défaut
        tracing_subscriber::EnvFilter::new("info,encore_auth=debug,hyper_util=warn,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::connection::create_pool(&config.database_url)?;
            Ok(Arc::new(UserRepository::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory user store, accounts are lost on restart");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = build_store(config)?;
    let production = config.environment.is_production();
    if production {
        tracing::warn!("No mail transport configured, reset links are not delivered");
    }
    let auth = AuthService::new(
        store,
        JwtManager::new(&config.jwt_secret, config.jwt_expiration_hours),
        Arc::new(LogMailer::new(!production)),
        ResetSettings {
            token_ttl: chrono::Duration::milliseconds(config.reset_token_ttl_ms),
            public_base_url: config.public_base_url.clone(),
        },
    );
    Ok(AppState::new(auth, &config.provider_secret))
}

// ----------------- Main -----------------

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    setup_logging();
    tracing::info!("Starting encore-auth...");

    let config = Config::from_env()?;
    let app = build_router(build_state(&config)?);

    if std::env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
        tracing::info!("Running in Lambda mode");
        lambda_http::run(app).await
    } else {
        tracing::info!(
            environment = config.environment.as_str(),
            "Running in local HTTP server mode"
        );
        let addr = config.socket_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("🚀 Server running at http://{}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}

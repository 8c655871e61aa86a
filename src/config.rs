use anyhow::Result;
use std::env;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Détecte automatiquement l'environnement
    fn detect_with(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        // Méthode 1: Vérifier si on est dans AWS Lambda
        if lookup("AWS_LAMBDA_FUNCTION_NAME").is_some() {
            return Self::Production;
        }

        // Méthode 2: Vérifier la variable APP_ENV
        match lookup("APP_ENV").as_deref() {
            Some("production" | "prod") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Où vivent les comptes utilisateurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub provider_secret: String,
    pub reset_token_ttl_ms: i64,
    pub public_base_url: String,
    pub server_host: String,
    pub server_port: u16,
}

/// Durée de validité d'un jeton de réinitialisation (6 minutes)
const DEFAULT_RESET_TOKEN_TTL_MS: i64 = 360_000;

/// 1 heure à 30 jours
const JWT_EXPIRATION_HOURS_RANGE: RangeInclusive<i64> = 1..=720;
/// 1 ms à 24 heures
const RESET_TOKEN_TTL_MS_RANGE: RangeInclusive<i64> = 1..=86_400_000;

impl Config {
    /// Charge la configuration depuis les variables d'environnement
    /// avec détection automatique de l'environnement
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = Environment::detect_with(lookup);

        tracing::info!(
            "🌍 Environment detected: {}",
            environment.as_str().to_uppercase()
        );

        let store_backend = Self::get_store_backend(lookup, &environment)?;
        let database_url = Self::get_database_url(lookup, &environment)?;
        let jwt_secret = Self::get_jwt_secret(lookup, &environment)?;
        let jwt_expiration_hours =
            Self::get_bounded(lookup, "JWT_EXPIRATION_HOURS", 1, JWT_EXPIRATION_HOURS_RANGE)?;
        let provider_secret = lookup("PROVIDER_SECRET").unwrap_or_default();
        if provider_secret.is_empty() {
            tracing::warn!("⚠️  PROVIDER_SECRET not set, provider callbacks are disabled");
        }
        let reset_token_ttl_ms = Self::get_bounded(
            lookup,
            "RESET_TOKEN_TTL_MS",
            DEFAULT_RESET_TOKEN_TTL_MS,
            RESET_TOKEN_TTL_MS_RANGE,
        )?;
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = lookup("SERVER_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{server_port}"));

        tracing::info!("✅ Configuration loaded successfully");
        tracing::debug!("   Store: {:?}", store_backend);
        tracing::debug!("   Database: {}", Self::mask_credentials(&database_url));
        tracing::debug!("   Public URL: {}", public_base_url);
        tracing::debug!("   Server: {}:{}", server_host, server_port);

        Ok(Self {
            environment,
            store_backend,
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            provider_secret,
            reset_token_ttl_ms,
            public_base_url,
            server_host,
            server_port,
        })
    }

    /// Récupère STORE_BACKEND; le store mémoire est interdit en production
    fn get_store_backend(
        lookup: &dyn Fn(&str) -> Option<String>,
        environment: &Environment,
    ) -> Result<StoreBackend> {
        let backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => anyhow::bail!("Unknown STORE_BACKEND: {other} (expected postgres or memory)"),
        };

        if backend == StoreBackend::Memory && environment.is_production() {
            anyhow::bail!("STORE_BACKEND=memory is not allowed in production");
        }

        Ok(backend)
    }

    /// Entier optionnel: défaut si absent, erreur s'il est illisible ou hors bornes
    fn get_bounded(
        lookup: &dyn Fn(&str) -> Option<String>,
        key: &str,
        default: i64,
        range: RangeInclusive<i64>,
    ) -> Result<i64> {
        let Some(raw) = lookup(key) else {
            return Ok(default);
        };
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} must be an integer, got {raw:?}: {e}"))?;

        if !range.contains(&value) {
            anyhow::bail!(
                "{key} must be between {} and {} (got {value})",
                range.start(),
                range.end()
            );
        }
        Ok(value)
    }

    /// Récupère DATABASE_URL avec logique intelligente
    fn get_database_url(
        lookup: &dyn Fn(&str) -> Option<String>,
        environment: &Environment,
    ) -> Result<String> {
        // Essayer DATABASE_URL directement (fonctionne dans tous les cas)
        if let Some(url) = lookup("DATABASE_URL") {
            return Ok(url);
        }

        // Si en prod et DATABASE_URL manque, erreur critique
        if environment.is_production() {
            anyhow::bail!(
                "DATABASE_URL must be set in production! \
                 Configure it in Lambda environment variables."
            );
        }

        // En dev, construire l'URL depuis les composants
        let part = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            part("POSTGRES_USER", "postgres"),
            part("POSTGRES_PASSWORD", "postgres"),
            part("DB_HOST", "localhost"),
            part("DB_PORT", "5432"),
            part("POSTGRES_DB", "encore"),
        ))
    }

    /// Récupère JWT_SECRET avec validation
    fn get_jwt_secret(
        lookup: &dyn Fn(&str) -> Option<String>,
        environment: &Environment,
    ) -> Result<String> {
        let secret = match lookup("JWT_SECRET") {
            Some(s) => s,
            None if environment.is_production() => {
                tracing::error!("❌ JWT_SECRET not set in production!");
                anyhow::bail!("JWT_SECRET is required in production");
            }
            None => {
                tracing::warn!("⚠️  JWT_SECRET not set, using default (DEVELOPMENT ONLY!)");
                "dev_secret_key_change_in_production".to_string()
            }
        };

        // Valider la longueur du secret en production
        if environment.is_production() && secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 characters in production (current: {})",
                secret.len()
            );
        }

        Ok(secret)
    }

    /// Masque les credentials dans les logs
    fn mask_credentials(url: &str) -> String {
        if let Some(at_pos) = url.find('@')
            && let Some(scheme_end) = url.find("://")
        {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos..];
            return format!("{scheme}***:***{after_at}");
        }
        url.to_string()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

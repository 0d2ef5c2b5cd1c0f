use serde::Deserialize;

/// Which relational engine backs the store, picked from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StoreBackend {
    Sqlite,
    Postgres,
}

impl StoreBackend {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            StoreBackend::Sqlite
        } else {
            StoreBackend::Postgres
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub backend: StoreBackend,
    pub jwt: JwtConfig,
    /// Secure cookies in production, plain http in local development.
    pub cookie_secure: bool,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:kodbank.db".into());
        let backend = StoreBackend::from_url(&database_url);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        let cookie_secure = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".into());
        Ok(Self {
            database_url,
            backend,
            jwt,
            cookie_secure,
            cors_origin,
        })
    }
}

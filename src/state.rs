use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, StoreBackend};
use crate::store::{BankStore, PgStore, SqliteStore};

/// Shared per-request state: configuration plus the injected store handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BankStore>,
}

impl AppState {
    /// Build state from the environment, connecting to whichever backend
    /// the database URL names and creating the schema if needed.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store: Arc<dyn BankStore> = match config.backend {
            StoreBackend::Sqlite => Arc::new(
                SqliteStore::connect(&config.database_url)
                    .await
                    .context("connect to sqlite database")?,
            ),
            StoreBackend::Postgres => Arc::new(
                PgStore::connect(&config.database_url)
                    .await
                    .context("connect to postgres database")?,
            ),
        };
        store.init_schema().await.context("create schema")?;
        Ok(Self { config, store })
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn BankStore>) -> Self {
        Self { config, store }
    }
}

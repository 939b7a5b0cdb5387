use std::sync::Arc;

use loadline_core::config::{AppConfig, ConfigError, LoadOptions};
use loadline_core::sessions::InMemorySessionStore;
use loadline_db::{
    connect_with_settings, migrations, DbPool, SqlCallRecordRepository, SqlLoadRepository,
};
use loadline_fmcsa::{FmcsaClient, FmcsaError};
use thiserror::Error;
use tracing::info;

use crate::state::{AppState, Collaborators};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub sessions: Arc<InMemorySessionStore>,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("fmcsa client setup failed: {0}")]
    Fmcsa(#[from] FmcsaError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let verifier = FmcsaClient::from_config(&config.fmcsa)?;
    let sessions = Arc::new(InMemorySessionStore::default());
    let state = AppState::new(
        Collaborators {
            sessions: sessions.clone(),
            verifier: Arc::new(verifier),
            catalog: Arc::new(SqlLoadRepository::new(db_pool.clone())),
            calls: Arc::new(SqlCallRecordRepository::new(db_pool.clone())),
        },
        &config.negotiation,
        config.server.api_key.clone(),
    );

    Ok(Application { config, db_pool, sessions, state })
}

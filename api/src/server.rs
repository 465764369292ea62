use crate::{create_router, AppState};
use settings::{FileSettings, SettingsProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use user::{SessionConfig, UserDatabaseConfig, UserManager, UserStore};

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// SQLite database holding users and sessions
    pub database_path: PathBuf,
    /// YAML file with the operator settings
    pub settings_path: PathBuf,
    /// Session cookie setup
    pub session: SessionConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            database_path: PathBuf::from("data/auto-register.db"),
            settings_path: PathBuf::from("data/settings.yaml"),
            session: SessionConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database path
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Set the settings file path
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    /// Set the session cookie configuration
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Start the API server with the given configuration
pub async fn start_server_with_config(config: ApiConfig) -> ServerResult<()> {
    let db_config = UserDatabaseConfig {
        database_path: config.database_path.clone(),
        ..UserDatabaseConfig::default()
    };
    let manager = UserManager::new(db_config, config.session.clone()).await?;
    manager.cleanup_expired().await?;

    let settings: Arc<dyn SettingsProvider> = Arc::new(FileSettings::open(&config.settings_path)?);
    if settings::shared_secret(settings.as_ref()).is_none() {
        warn!(
            "No magic link secret configured in {}; every token will be rejected",
            config.settings_path.display()
        );
    }

    let users: Arc<dyn UserStore> = manager.database();
    let state = AppState::new(settings, users, &config.session);
    let session_layer = config
        .session
        .layer(manager.session_store().inner().clone());
    let app = create_router(state, session_layer);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Start the API server in a background task with custom configuration
pub fn spawn_server_with_config(config: ApiConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}

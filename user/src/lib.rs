pub mod auth;
pub mod database;
pub mod error;

use std::sync::Arc;
use tracing::info;

pub use auth::{SessionConfig, SqlxSessionStore};
use database::UserDatabase;

/// User storage and session persistence sharing one SQLite database
pub struct UserManager {
    database: Arc<UserDatabase>,
    session_store: SqlxSessionStore,
    session_config: SessionConfig,
}

impl UserManager {
    /// Create a new user manager with the provided configuration
    pub async fn new(
        db_config: database::UserDatabaseConfig,
        session_config: SessionConfig,
    ) -> error::Result<Self> {
        info!("Initializing user storage and sessions");

        let database = Arc::new(database::UserDatabase::new(db_config).await?);
        let session_store = SqlxSessionStore::new(database.pool().clone()).await?;

        info!("User storage initialized successfully");

        Ok(Self {
            database,
            session_store,
            session_config,
        })
    }

    /// Get a shared handle to the database
    pub fn database(&self) -> Arc<UserDatabase> {
        self.database.clone()
    }

    /// Get a reference to the session store
    pub fn session_store(&self) -> &SqlxSessionStore {
        &self.session_store
    }

    /// Get the session configuration
    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> error::Result<u64> {
        let removed = self.session_store.cleanup_expired().await?;
        info!("Cleaned up {} expired sessions", removed);
        Ok(removed)
    }
}

// Re-export commonly used types
pub use database::UserDatabaseConfig;
pub use error::{Result as UserResult, UserError};

pub use auth::{
    CurrentUser, GateOutcome, LoginHooks, LoginListener, MagicLink, MemoryUserStore, NewUser,
    ProvisionedUser, SessionContext, TowerSessionContext, TracingLoginListener, UserId, UserStore,
    TOKEN_PARAM,
};
pub use auth::types::CurrentUserResponse;
pub use auth::store::SameSiteConfig;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_user_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = UserDatabaseConfig {
            database_path: temp_dir.path().join("test_user.db"),
            max_connections: 5,
            connection_timeout: 30,
        };

        let manager = UserManager::new(config, SessionConfig::default())
            .await
            .unwrap();

        manager.database().ping().await.unwrap();
        assert_eq!(manager.cleanup_expired().await.unwrap(), 0);
        assert_eq!(manager.session_config().cookie_name, "autoreg_session");
    }
}

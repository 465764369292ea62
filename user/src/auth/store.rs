//! SQLx session store and session cookie configuration

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{debug, error, info};

use crate::error::{Result, UserError};

/// SQLx-based session store for tower-sessions
#[derive(Debug, Clone)]
pub struct SqlxSessionStore {
    store: SqliteStore,
    pool: SqlitePool,
}

impl SqlxSessionStore {
    /// Create a new SQLx session store, creating its table when missing
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = SqliteStore::new(pool.clone());
        store.migrate().await.map_err(|e| {
            error!("Failed to create session table: {}", e);
            UserError::Database(e)
        })?;

        info!("SQLx session store initialized");
        Ok(Self { store, pool })
    }

    /// Get the underlying SqliteStore
    pub fn inner(&self) -> &SqliteStore {
        &self.store
    }

    /// Delete sessions whose expiry date has passed
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();

        let deleted = sqlx::query("DELETE FROM tower_sessions WHERE expiry_date < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to cleanup expired sessions: {}", e);
                UserError::Database(e)
            })?;

        debug!("Removed {} expired sessions", deleted.rows_affected());
        Ok(deleted.rows_affected())
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    pub cookie_name: String,
    /// Whether to use secure cookies (HTTPS only)
    pub secure: bool,
    /// SameSite cookie attribute
    pub same_site: SameSiteConfig,
    /// HTTP only cookie (not accessible via JavaScript)
    pub http_only: bool,
    /// Keep logins across browser restarts
    pub remember_login: bool,
    /// Inactivity window for remembered logins, in days
    pub remember_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "autoreg_session".to_string(),
            secure: false,
            same_site: SameSiteConfig::Lax,
            http_only: true,
            remember_login: false,
            remember_days: 14,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_remember_login(mut self, remember: bool) -> Self {
        self.remember_login = remember;
        self
    }

    #[must_use]
    pub fn with_remember_days(mut self, days: i64) -> Self {
        self.remember_days = days;
        self
    }

    /// Inactivity window applied to remembered logins.
    pub fn remember_for(&self) -> time::Duration {
        time::Duration::days(self.remember_days)
    }

    /// Build the tower-sessions layer for `store` with this cookie setup.
    pub fn layer<S: SessionStore + Clone>(&self, store: S) -> SessionManagerLayer<S> {
        SessionManagerLayer::new(store)
            .with_name(self.cookie_name.clone())
            .with_secure(self.secure)
            .with_same_site(self.same_site.into())
            .with_http_only(self.http_only)
            .with_expiry(Expiry::OnSessionEnd)
    }
}

/// SameSite cookie configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SameSiteConfig {
    Strict,
    Lax,
    None,
}

impl From<SameSiteConfig> for tower_sessions::cookie::SameSite {
    fn from(config: SameSiteConfig) -> Self {
        match config {
            SameSiteConfig::Strict => tower_sessions::cookie::SameSite::Strict,
            SameSiteConfig::Lax => tower_sessions::cookie::SameSite::Lax,
            SameSiteConfig::None => tower_sessions::cookie::SameSite::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use tempfile::TempDir;

    async fn create_test_pool(temp_dir: &TempDir) -> SqlitePool {
        let db_path = temp_dir.path().join("test_sessions.db");
        SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_store_creation() {
        let temp_dir = TempDir::new().unwrap();
        let pool = create_test_pool(&temp_dir).await;
        let store = SqlxSessionStore::new(pool.clone()).await.unwrap();

        // Verify table exists by querying it
        let result = sqlx::query("SELECT COUNT(*) as count FROM tower_sessions")
            .fetch_one(&pool)
            .await;
        assert!(result.is_ok());

        assert_eq!(store.cleanup_expired().await.unwrap(), 0);
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();

        assert_eq!(config.cookie_name, "autoreg_session");
        assert!(!config.secure);
        assert!(config.http_only);
        assert!(!config.remember_login);
        assert_eq!(config.remember_for(), time::Duration::days(14));
    }

    #[test]
    fn test_session_config_builders() {
        let config = SessionConfig::default()
            .with_cookie_name("site_session")
            .with_secure(true)
            .with_remember_login(true)
            .with_remember_days(2);

        assert_eq!(config.cookie_name, "site_session");
        assert!(config.secure);
        assert!(config.remember_login);
        assert_eq!(config.remember_for(), time::Duration::days(2));
    }
}

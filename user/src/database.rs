use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::OsRng;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::auth::types::{NewUser, ProvisionedUser, UserId};
use crate::auth::UserStore;
use crate::error::{Result, UserError};

/// Configuration for the user database
#[derive(Debug, Clone)]
pub struct UserDatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl Default for UserDatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/auto-register.db"),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

/// SQLite-backed user store
#[derive(Debug, Clone)]
pub struct UserDatabase {
    pool: Pool<Sqlite>,
}

impl UserDatabase {
    /// Open (creating if needed) the user database and run migrations
    pub async fn new(config: UserDatabaseConfig) -> Result<Self> {
        // Ensure the directory exists
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&config.database_path)
                    .create_if_missing(true),
            )
            .await
            .map_err(|e| {
                UserError::Initialization(format!(
                    "Failed to open {}: {}",
                    config.database_path.display(),
                    e
                ))
            })?;

        let db = Self::from_pool(pool).await?;
        info!(
            "User database ready at {}",
            config.database_path.display()
        );
        Ok(db)
    }

    /// Wrap an existing pool and run migrations on it
    pub async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        debug!("Running user database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                locale TEXT NOT NULL,
                show_admin_bar_front BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        debug!("User database migrations completed");
        Ok(())
    }

    /// Get the database pool for external use
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Number of stored users
    pub async fn count_users(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Close the database connection
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        info!("User database connection closed");
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Provisioning(format!("Failed to hash password: {}", e)))
}

#[async_trait]
impl UserStore for UserDatabase {
    async fn create_user(&self, user: NewUser) -> Result<UserId> {
        let password_hash = hash_password(&user.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (login, password_hash, role, locale, show_admin_bar_front, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.login)
        .bind(&password_hash)
        .bind(&user.role)
        .bind(&user.locale)
        .bind(user.show_admin_bar_front)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted user {} with id {}", user.login, id);
        Ok(id)
    }

    async fn load_user(&self, id: UserId) -> Result<Option<ProvisionedUser>> {
        let query = r#"
            SELECT id, login, role, locale, show_admin_bar_front, created_at
            FROM users
            WHERE id = ?
        "#;

        let user = sqlx::query_as::<_, ProvisionedUser>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

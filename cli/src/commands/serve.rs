use anyhow::Result;
use api::ApiConfig;
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use user::SessionConfig;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "AUTOREG_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "AUTOREG_PORT", default_value_t = 3030)]
    pub port: u16,

    /// SQLite database for users and sessions
    #[arg(long, env = "AUTOREG_DATABASE", default_value = "data/auto-register.db")]
    pub database: PathBuf,

    /// Session cookie name
    #[arg(long, env = "AUTOREG_COOKIE_NAME", default_value = "autoreg_session")]
    pub cookie_name: String,

    /// Only send the session cookie over HTTPS
    #[arg(long, env = "AUTOREG_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Keep magic link logins across browser restarts
    #[arg(long, env = "AUTOREG_REMEMBER_LOGIN")]
    pub remember_login: bool,

    /// Days a remembered login survives without activity
    #[arg(long, env = "AUTOREG_REMEMBER_DAYS", default_value_t = 14)]
    pub remember_days: i64,

    /// Directory for daily log files; console only when unset
    #[arg(long, env = "AUTOREG_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ServeArgs {
    pub fn to_config(&self, settings_path: PathBuf) -> ApiConfig {
        let session = SessionConfig::default()
            .with_cookie_name(self.cookie_name.clone())
            .with_secure(self.secure_cookies)
            .with_remember_login(self.remember_login)
            .with_remember_days(self.remember_days);

        ApiConfig::new()
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_database_path(self.database.clone())
            .with_settings_path(settings_path)
            .with_session(session)
    }
}

/// Run the server until interrupted
pub async fn execute(args: ServeArgs, settings_path: PathBuf) -> Result<()> {
    let config = args.to_config(settings_path);
    info!(
        "Starting Auto Register on {} (database {}, settings {})",
        config.bind_address(),
        config.database_path.display(),
        config.settings_path.display()
    );

    api::start_server_with_config(config)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{config, health, link, serve};

/// Auto Register CLI - magic link registration server and settings
#[derive(Parser)]
#[command(name = "autoreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file holding the magic key and registration defaults
    #[arg(
        long,
        global = true,
        env = "AUTOREG_SETTINGS",
        default_value = "data/settings.yaml"
    )]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with the magic link gate
    Serve(serve::ServeArgs),

    /// Read and change registration settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print the magic link for the configured key
    Link {
        /// Site URL the token is appended to
        #[arg(
            long,
            env = "AUTOREG_BASE_URL",
            default_value = "http://localhost:3030/"
        )]
        base_url: String,
    },

    /// Check the health of a running server
    Health {
        /// Server URL
        #[arg(long, env = "AUTOREG_URL", default_value = "http://localhost:3030")]
        url: String,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// List all stored settings
    List {
        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read one setting
    Get {
        /// Setting key (e.g. "ar_otp_key")
        key: String,
    },

    /// Store one setting; the value is sanitized first
    Set {
        /// Setting key (e.g. "ar_redirect_url")
        key: String,

        /// New value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; the server also writes to a log directory when given
    let _guard = match &cli.command {
        Commands::Serve(args) => logging::init_server_logging(args.log_dir.as_deref(), cli.verbose)?,
        _ => {
            logging::init_cli_logging(cli.verbose);
            None
        }
    };

    // Execute the command
    match cli.command {
        Commands::Serve(args) => {
            serve::execute(args, cli.settings).await?;
            logging::log_shutdown();
        }
        Commands::Settings { action } => match action {
            SettingsAction::List { format } => config::list(&cli.settings, &format)?,
            SettingsAction::Get { key } => config::get(&cli.settings, &key)?,
            SettingsAction::Set { key, value } => config::set(&cli.settings, &key, &value)?,
        },
        Commands::Link { base_url } => link::execute(&cli.settings, &base_url)?,
        Commands::Health { url, format } => health::execute(&url, &format).await?,
    }

    Ok(())
}

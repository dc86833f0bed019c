//! deckhand operator console
//!
//! Command-line client for a workspace orchestration server. Talks to the
//! server over a single WebSocket session, multiplexing request/reply
//! exchanges and live pushes (service logs, init progress) over the one
//! connection.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deckhand::commands;
use deckhand::output::print_error;
use dh_client::config as client_config;
use dh_client::{ClientConfig, SessionManager};

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(author, version, about = "Operator console for a workspace orchestration server")]
#[command(propagate_version = true)]
struct Cli {
    /// Server address (host:port), overrides the config file
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Path to console configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seconds to wait for the connection and for replies
    #[arg(short, long, global = true, default_value_t = 10)]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connection state and the cached session summary
    Status,

    /// List services known to the server
    Services {
        /// Also fetch runtime status (pid, uptime) per service
        #[arg(short, long)]
        detail: bool,
    },

    /// Start a service
    Start {
        /// Service name
        service: String,
    },

    /// Stop a service
    Stop {
        /// Service name
        service: String,
    },

    /// Run workspace initialization and stream its progress
    Init,

    /// Upload a configuration file; a valid one becomes current
    Upload {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// Validate a configuration file without storing it
    Parse {
        /// Path to the configuration file
        file: PathBuf,
    },

    /// Diff a configuration file against the server's current one
    Diff {
        /// Path to the candidate configuration file
        file: PathBuf,
    },

    /// Fetch recent log lines for a service
    Logs {
        /// Service name
        service: String,
        /// Number of recent lines to request
        #[arg(short = 'n', long, default_value_t = 100)]
        tail: u32,
    },

    /// Follow the session log until interrupted
    Watch,

    /// Manage console configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current console configuration
    Show,
    /// Show the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Local commands need no session
    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show => commands::config_show(cli.config.as_deref())?,
            ConfigAction::Path => commands::config_path(),
        }
        return Ok(());
    }

    let config = load_client_config(&cli);
    let wait = Duration::from_secs(cli.timeout);

    let session = SessionManager::connect(config);
    if let Err(e) = commands::wait_connected(&session, wait).await {
        print_error(&format!("{e}"));
        print_error("Is the orchestration server running?");
        session.shutdown();
        return Err(e);
    }

    let result = match cli.command {
        Commands::Status => commands::status_command(&session, wait).await,
        Commands::Services { detail } => commands::services_command(&session, wait, detail).await,
        Commands::Start { service } => commands::start_command(&session, wait, &service).await,
        Commands::Stop { service } => commands::stop_command(&session, wait, &service).await,
        Commands::Init => commands::init_command(&session, wait).await,
        Commands::Upload { file } => commands::upload_command(&session, wait, &file).await,
        Commands::Parse { file } => commands::parse_command(&session, wait, &file).await,
        Commands::Diff { file } => commands::diff_command(&session, wait, &file).await,
        Commands::Logs { service, tail } => {
            commands::logs_command(&session, wait, &service, tail).await
        }
        Commands::Watch => commands::watch_command(&session).await,
        // Handled before the session was created
        Commands::Config { .. } => Ok(()),
    };

    session.shutdown();
    result
}

fn load_client_config(cli: &Cli) -> ClientConfig {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(client_config::default_config_path);

    let mut config: ClientConfig = if path.exists() {
        client_config::load_config(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", path, e);
            ClientConfig::default()
        })
    } else {
        ClientConfig::default()
    };

    if let Some(server) = &cli.server {
        config.server_address = server.clone();
    }
    config
}

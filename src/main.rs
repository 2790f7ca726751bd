//! TakeCharge service binary
//!
//! Reads configuration from a TOML file (~/.config/takecharge/config.toml),
//! starts the REST API and runs until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use takecharge::config::{default_config_path, AppConfig, CONFIG_ENV_VAR};
use takecharge::server::{init_tracing, open_store, ServerHandle, ServerOptions};

#[derive(Debug, Parser)]
#[command(name = "takecharge-service", version, about = "EV charging booking service")]
struct Cli {
    /// Config file path
    #[arg(long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Override `server.api_port`
    #[arg(long)]
    api_port: Option<u16>,

    /// Override `logging.level` (RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,

    /// Load the config, open the store, run migrations and exit
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (mut app_cfg, load_error) = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        }
    } else {
        (AppConfig::default(), None)
    };

    if let Some(port) = cli.api_port {
        app_cfg.server.api_port = port;
    }
    if let Some(level) = cli.log_level {
        app_cfg.logging.level = level;
    }

    init_tracing(&app_cfg);
    match load_error {
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
        None if config_path.exists() => info!("Configuration loaded from {}", config_path.display()),
        None => info!("No config at {}, using defaults", config_path.display()),
    }

    if cli.check {
        open_store(&app_cfg, !cli.no_migrate).await?;
        info!("✅ Configuration and store OK");
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config: app_cfg,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Start listening for shutdown signals (SIGTERM, SIGINT)
    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.wait().await;
    Ok(())
}

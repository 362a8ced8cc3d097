//! gridbot — daemon entry point
//!
//! Orchestrates:
//! 1. CLI + env + logging initialization
//! 2. YAML config load and translation into grid parameters
//! 3. Credential resolution (env first, exchange file fallback)
//! 4. Staged daemon startup with fail-fast abort
//! 5. SIGTERM/SIGINT graceful shutdown with fault-isolated cleanup

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use gridbot::config::{
    init_logging, load_config, resolve_exchange_settings, DEFAULT_EXCHANGE_CONFIG_DIR,
};
use gridbot::core::{install_signal_bridge, GridDaemon, ShutdownSignal, DEFAULT_STATS_INTERVAL_SECS};

#[derive(Parser, Debug)]
#[command(name = "gridbot", version, about = "Unattended grid trading daemon")]
struct Cli {
    /// Path to the grid configuration YAML file
    config: PathBuf,

    /// Enable debug logging for the trading modules
    #[arg(long)]
    debug: bool,

    /// Statistics reporting interval in seconds
    #[arg(long, default_value_t = DEFAULT_STATS_INTERVAL_SECS)]
    stats_interval: u64,

    /// Directory holding per-exchange credential files
    #[arg(long, default_value = DEFAULT_EXCHANGE_CONFIG_DIR)]
    exchange_config_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.debug);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %chrono::Utc::now().to_rfc3339(),
        "=== gridbot daemon ==="
    );

    if !cli.config.is_file() {
        error!(path = %cli.config.display(), "Configuration file not found");
        std::process::exit(1);
    }

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, path = %cli.config.display(), "Could not load configuration");
            std::process::exit(1);
        }
    };

    info!(
        exchange = %config.exchange,
        symbol = %config.symbol,
        grid_type = config.grid_type.as_str(),
        "Configuration loaded"
    );

    let settings = resolve_exchange_settings(&config.exchange, &cli.exchange_config_dir);

    let shutdown = ShutdownSignal::new();
    let signal_handle = install_signal_bridge(shutdown.clone());

    let mut daemon = GridDaemon::new(config, settings);
    let outcome = daemon
        .run(shutdown, Duration::from_secs(cli.stats_interval))
        .await;

    signal_handle.abort();

    match outcome {
        Ok(()) => {
            info!("=== Shutdown complete ===");
        }
        Err(err) => {
            error!(error = %err, phase = ?daemon.phase(), "Daemon terminated with error");
            std::process::exit(1);
        }
    }
}

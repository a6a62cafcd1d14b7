//! Snippetbox server binary.
//!
//! ```text
//! snippetbox [--config snippetbox.toml] [--addr 0.0.0.0:4000]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use snippetbox::config::{load_config, validate_config, AppConfig, ConfigError};
use snippetbox::lifecycle::{wait_for_signal, Shutdown};
use snippetbox::observability::{logging, metrics};
use snippetbox::HttpServer;

#[derive(Parser)]
#[command(name = "snippetbox")]
#[command(about = "Server-rendered snippet sharing service", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    addr: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(addr) = &cli.addr {
        config.listener.bind_address = addr.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("snippetbox v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        session_lifetime_secs = config.session.lifetime_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let drain_deadline = Duration::from_secs(config.timeouts.shutdown_secs);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = wait_for_signal() => shutdown.trigger(),
    }

    match tokio::time::timeout(drain_deadline, server_task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            deadline_secs = drain_deadline.as_secs(),
            "Shutdown deadline exceeded, abandoning in-flight requests"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

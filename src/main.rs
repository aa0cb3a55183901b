//! API relay.
//!
//! ```text
//!   Browser SPA                      api-relay                         Backend
//!  ─────────────  OPTIONS  ──▶  preflight (CORS only)
//!  ─────────────  GET/POST ──▶  strip mount prefix ──▶ http://host:port/api/...
//!                               ◀── status + body + Content-Type ────────────
//!  ◀── response + CORS headers
//!                               timeout → 504, network failure → 500
//! ```
//!
//! `api-relay serve` runs the relay as an HTTP server; `api-relay invoke`
//! runs it once over a JSON event, the way a serverless host would.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_relay::config::{load_config, watcher::ConfigWatcher, RelayConfig};
use api_relay::lifecycle::{shutdown_signal, Shutdown};
use api_relay::observability::{logging, metrics};
use api_relay::{HttpServer, InboundRequest, RequestRelay};

#[derive(Parser)]
#[command(name = "api-relay", version)]
#[command(about = "Relay browser API calls to the file-transfer backend", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the relay over HTTP (default)
    Serve,
    /// Relay a single event read as JSON and print the response JSON
    Invoke {
        /// Event file; stdin when omitted.
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, cli.config).await,
        Command::Invoke { event } => invoke(config, event).await,
    }
}

async fn serve(
    config: RelayConfig,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("api-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_prefix = %config.mount.prefix,
        upstream_host = %config.upstream.host,
        upstream_port = config.upstream.port,
        timeout_ms = config.timeouts.upstream_ms,
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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Held for the lifetime of the server so reloads keep arriving.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config)?;

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn invoke(
    config: RelayConfig,
    event_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match event_path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            raw
        }
    };

    let event: InboundRequest = serde_json::from_str(&raw)?;
    let relay = RequestRelay::from_config(&config)?;
    let response = relay.handle(event).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

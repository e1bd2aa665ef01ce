//! foldserve: serve a local folder over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────────┐
//!                    │                      SESSION                       │
//!                    │                                                    │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌────────────────┐   │
//!   ─────────────────┼─▶│  net +  │──▶│ request  │──▶│ RequestMapper  │   │
//!                    │  │  http   │   │canonical-│   │ Index → Direct │   │
//!                    │  │ server  │   │  ization │   │    → Routes    │   │
//!                    │  └─────────┘   └──────────┘   └───────┬────────┘   │
//!                    │                                       │            │
//!   Client Response  │  ┌─────────┐   ┌──────────┐           ▼            │
//!   ◀────────────────┼──│response │◀──│ Resolver │◀── resolved path       │
//!                    │  └─────────┘   └──────────┘                        │
//!                    │                                                    │
//!                    │  routes.json ──▶ watcher ──▶ ArcSwap<RouteSet>     │
//!                    └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use foldserve::config::loader::load_config;
use foldserve::config::validation::validate_config;
use foldserve::lifecycle::signals::shutdown_signal;
use foldserve::observability::{logging, metrics};
use foldserve::{ServerConfig, Session};

#[derive(Parser)]
#[command(name = "foldserve")]
#[command(about = "Serve a local folder over HTTP with hot-reloaded routes", long_about = None)]
struct Cli {
    /// Folder to serve.
    root: PathBuf,

    /// Server settings file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the settings file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the settings file).
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (overrides the settings file).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<(PathBuf, ServerConfig), Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        if let Err(errors) = validate_config(&config) {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!("Invalid configuration: {joined}").into());
        }

        Ok((self.root, config))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (root, config) = Cli::parse().into_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!("foldserve v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let mut session = Session::new(config);
    session.start(&root).await?;
    if let Some(url) = session.server_url() {
        tracing::info!(url = %url, root = %root.display(), "Serving");
    }

    let signal = shutdown_signal().await;
    session.stop().await;
    signal?;

    tracing::info!("Shutdown complete");
    Ok(())
}

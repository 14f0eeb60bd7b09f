//! WebDriver session-tracking reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               WEBDRIVER PROXY                │
//!   Client            │                                              │
//!   (Selenium)  ──────┼─▶ capture request body                       │
//!                     │     → initialize session (POST /session)     │
//!                     │       → release session (DELETE)             │
//!                     │         → classify errors                    │
//!                     │           → log command                      │
//!                     │             → capture response body          │
//!                     │               → forward ─────────────────────┼──▶ Automation
//!                     │                                              │    server
//!                     │  ┌────────────────────┐  ┌────────────────┐  │
//!                     │  │ session registry   │◀─│ admin API      │  │
//!                     │  │ (id → context, TTL)│  │ (lookup)       │  │
//!                     │  └────────────────────┘  └────────────────┘  │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use webdriver_proxy::config::{load_config, ProxyConfig};
use webdriver_proxy::lifecycle;
use webdriver_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "webdriver-proxy")]
#[command(about = "Reverse proxy that tracks WebDriver sessions", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Upstream automation server URL (overrides the config file).
    #[arg(long)]
    upstream_url: Option<String>,

    /// Listener bind address (overrides the config file).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(url) = args.upstream_url {
        config.upstream.url = url;
    }
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        "webdriver-proxy starting"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

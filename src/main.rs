//! Framing proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    FRAMING PROXY                      │
//!                      │                                                       │
//!  iframe request      │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!  ────────────────────┼─▶│   net    │──▶│   http   │──▶│  target resolver │  │
//!  /proxy?url=...      │  │ listener │   │  router  │   └────────┬─────────┘  │
//!                      │  └──────────┘   └──────────┘            │            │
//!                      │                                         ▼            │
//!                      │                                ┌──────────────────┐  │
//!                      │                                │ upstream fetcher │◀─┼──── origin
//!                      │                                │ (charset decode) │  │     server
//!                      │                                └────────┬─────────┘  │
//!                      │                                         ▼            │
//!  framed response     │  ┌──────────────────┐          ┌──────────────────┐  │
//!  ◀───────────────────┼──│    translator    │◀─────────│  html rewriter   │  │
//!                      │  │ (header policy)  │          │ + script inject  │  │
//!                      │  └──────────────────┘          └──────────────────┘  │
//!                      │                                                       │
//!                      │  config · observability · lifecycle                  │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use frame_proxy::config::{load_config, validate_config, ProxyConfig};
use frame_proxy::lifecycle::{shutdown_on_ctrl_c, Shutdown};
use frame_proxy::net;
use frame_proxy::observability::logging;
use frame_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "frame-proxy")]
#[command(about = "Forwarding proxy that makes arbitrary pages embeddable in an iframe", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Skip upstream TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Try up to N consecutive ports when the requested one is taken
    #[arg(long, value_name = "N")]
    port_search: Option<u16>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut ProxyConfig) {
        if self.host.is_some() || self.port.is_some() {
            let (default_host, default_port) = split_host_port(&config.listener.bind_address);
            let host = self.host.as_deref().unwrap_or(default_host);
            let port = self.port.unwrap_or(default_port);
            config.listener.bind_address = if host.contains(':') && !host.starts_with('[') {
                format!("[{host}]:{port}")
            } else {
                format!("{host}:{port}")
            };
        }
        if self.insecure {
            config.upstream.verify_certificates = false;
        }
        if let Some(attempts) = self.port_search {
            config.listener.port_search_attempts = attempts;
        }
    }
}

/// Split "host:port", falling back to the stock port when it is missing.
fn split_host_port(address: &str) -> (&str, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(9999)),
        None => (address, 9999),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "frame-proxy starting");

    let listener = net::bind(&config.listener).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        usage = %format!("http://{local_addr}/proxy?url=https://example.com"),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(shutdown_on_ctrl_c(shutdown));

    let server = HttpServer::new(config)?;
    server.run(listener, receiver).await?;

    tracing::info!("frame-proxy stopped");
    Ok(())
}

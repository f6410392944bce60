//! Arachne gateway server binary.
//!
//! Usage:
//!   arachne-gateway --config config.toml
//!   arachne-gateway --port 8080
//!   arachne-gateway --port 8080 --bind 0.0.0.0
//!
//! # Environment Variables
//!
//! - `ARACHNE_BIND_ADDR` - Server bind address (default: 127.0.0.1)
//! - `ANTHROPIC_API_KEY` - API key for Anthropic model tiers
//! - `OPENAI_API_KEY` - API key for OpenAI-compatible model tiers

use arachne_gateway::{AppState, GatewayConfig, serve};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,arachne_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments (simple for now)
    let args: Vec<String> = std::env::args().collect();
    let mut port: Option<u16> = None;
    let mut config_path: Option<String> = None;
    let mut bind_addr: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = Some(args[i + 1].parse().expect("Invalid port number"));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    bind_addr = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Arachne Gateway Server");
                println!();
                println!("Usage: arachne-gateway [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>    Port to listen on (default: 8080)");
                println!(
                    "  -b, --bind <ADDR>    Bind address (default: 127.0.0.1, env: ARACHNE_BIND_ADDR)"
                );
                println!("  -c, --config <FILE>  Path to config.toml file");
                println!("  -h, --help           Show this help message");
                println!();
                println!("Environment variables:");
                println!("  ARACHNE_BIND_ADDR    Server bind address (overridden by --bind flag)");
                println!("  ANTHROPIC_API_KEY    API key for Anthropic model tiers");
                println!("  OPENAI_API_KEY       API key for OpenAI-compatible model tiers");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    // Load configuration
    let mut config = if let Some(path) = config_path {
        tracing::info!(path = %path, "Loading configuration");
        GatewayConfig::from_file(&path)?
    } else {
        tracing::info!("Using default configuration");
        GatewayConfig::default()
    };

    // CLI flag > env var > config file > default
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(bind) = bind_addr.or_else(|| std::env::var("ARACHNE_BIND_ADDR").ok()) {
        config.bind = bind;
    }

    if config.bind == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0 — this exposes the gateway to all network interfaces. \
             Ensure a firewall is in place."
        );
    }

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = AppState::new(config)?;
    serve(Arc::new(state), addr).await?;

    Ok(())
}

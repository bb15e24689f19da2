//! # battle-bridge
//!
//! Exposes the D&D Battle Manager backend to MCP clients. Loads the
//! MCP-tagged OpenAPI document, points an HTTP client at the backend, and
//! serves one tool per operation through `mcp-server`.

pub mod assembler;
pub mod backend;
pub mod cli;
pub mod config;
mod error;
pub mod filter;
pub mod loader;
pub mod telemetry;

pub use config::{BridgeConfig, TagPolicy, Transport};
pub use error::{BridgeError, LoadError, Result};

use mcp_server::HttpForwarder;
use std::time::Duration;
use tracing::info;

/// Assemble the tool server and serve until the transport ends
pub async fn run(config: BridgeConfig) -> Result<()> {
    info!(
        "Starting {} (spec {}, backend {})",
        config.name,
        config.spec_path.display(),
        config.base_url
    );
    let server = assembler::create_mcp_server(&config)?;
    server.run().await?;
    info!("{} stopped", config.name);
    Ok(())
}

/// Relay stdio to an HTTP MCP endpoint until stdin closes
pub async fn forward(url: &str, timeout: Duration) -> Result<()> {
    HttpForwarder::new(url, timeout)?.run().await?;
    Ok(())
}

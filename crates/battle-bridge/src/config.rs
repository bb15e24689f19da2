//! Runtime configuration for the bridge

use clap::ValueEnum;
use mcp_server::ServerMode;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// OpenAPI document served when no path is given, relative to the working directory
pub const DEFAULT_SPEC_PATH: &str = "backend/openapi-mcp.json";
/// Unfiltered document the `filter` command reads by default
pub const DEFAULT_FULL_SPEC_PATH: &str = "backend/openapi-full.json";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SERVER_NAME: &str = "DnD Battle Manager";
pub const DEFAULT_HTTP_PORT: u16 = 8001;

/// Transport the assembled server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

/// How operations lacking the MCP tag are treated before assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TagPolicy {
    /// Serve the document as-is
    Trust,
    /// Serve the document as-is, logging each untagged operation
    #[default]
    Warn,
    /// Drop untagged operations before building tools
    Enforce,
}

/// Everything needed to assemble and run the tool server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub spec_path: PathBuf,
    pub base_url: String,
    pub timeout: Duration,
    pub name: String,
    pub transport: Transport,
    pub port: u16,
    pub tag_policy: TagPolicy,
    pub tag: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from(DEFAULT_SPEC_PATH),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            name: DEFAULT_SERVER_NAME.to_string(),
            transport: Transport::default(),
            port: DEFAULT_HTTP_PORT,
            tag_policy: TagPolicy::default(),
            tag: openapi_parser::DEFAULT_MCP_TAG.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Server mode for the configured transport; HTTP listens on localhost only
    pub fn server_mode(&self) -> ServerMode {
        match self.transport {
            Transport::Stdio => ServerMode::Stdio,
            Transport::Http => ServerMode::Http {
                addr: SocketAddr::from((Ipv4Addr::LOCALHOST, self.port)),
            },
        }
    }
}

//! Command-line interface

use clap::{Args, Parser, Subcommand};
use mcp_server::transport::DEFAULT_FORWARD_URL;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    BridgeConfig, TagPolicy, Transport, DEFAULT_BASE_URL, DEFAULT_FULL_SPEC_PATH,
    DEFAULT_HTTP_PORT, DEFAULT_SERVER_NAME, DEFAULT_SPEC_PATH, DEFAULT_TIMEOUT_SECS,
};

/// Serves the battle manager's MCP-tagged API routes as MCP tools
#[derive(Parser, Debug)]
#[command(name = "battle-mcp-bridge")]
#[command(version)]
#[command(about = "Expose the D&D Battle Manager API to MCP clients")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve tools built from the OpenAPI document (the default)
    Serve(ServeArgs),
    /// Write an OpenAPI document containing only the MCP-tagged operations
    Filter(FilterArgs),
    /// Relay stdio JSON-RPC to a server running the HTTP transport
    Forward(ForwardArgs),
}

impl Cli {
    /// The selected command; no subcommand means `serve`
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// OpenAPI document to build tools from
    #[arg(long, env = "BATTLE_MCP_SPEC", default_value = DEFAULT_SPEC_PATH)]
    pub spec: PathBuf,

    /// Backend the tools call
    #[arg(long, env = "BATTLE_MCP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout for backend calls, in seconds
    #[arg(long, env = "BATTLE_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Server name reported to MCP clients
    #[arg(long, env = "BATTLE_MCP_NAME", default_value = DEFAULT_SERVER_NAME)]
    pub name: String,

    #[arg(long, env = "BATTLE_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Port for the HTTP transport
    #[arg(long, env = "BATTLE_MCP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Treatment of operations missing the MCP tag
    #[arg(long, env = "BATTLE_MCP_TAG_POLICY", value_enum, default_value_t = TagPolicy::Warn)]
    pub tag_policy: TagPolicy,

    /// Tag marking operations meant for MCP
    #[arg(long, default_value = openapi_parser::DEFAULT_MCP_TAG)]
    pub tag: String,
}

impl From<ServeArgs> for BridgeConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            spec_path: args.spec,
            base_url: args.base_url,
            timeout: Duration::from_secs(args.timeout_secs),
            name: args.name,
            transport: args.transport,
            port: args.port,
            tag_policy: args.tag_policy,
            tag: args.tag,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Full OpenAPI document
    #[arg(long, default_value = DEFAULT_FULL_SPEC_PATH)]
    pub input: PathBuf,

    /// Where to write the filtered document
    #[arg(long, default_value = DEFAULT_SPEC_PATH)]
    pub output: PathBuf,

    #[arg(long, default_value = openapi_parser::DEFAULT_MCP_TAG)]
    pub tag: String,
}

#[derive(Args, Debug, Clone)]
pub struct ForwardArgs {
    /// HTTP MCP endpoint to forward to
    #[arg(long, env = "BATTLE_MCP_FORWARD_URL", default_value = DEFAULT_FORWARD_URL)]
    pub url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

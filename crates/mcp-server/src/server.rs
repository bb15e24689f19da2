//! Main MCP server orchestration

use openapi_parser::OpenApiParser;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::client::BackendClient;
use crate::error::Result;
use crate::protocol::RequestHandler;
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::transport::{HttpTransport, StdioTransport};

/// Server mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// stdio transport (for desktop MCP clients)
    #[default]
    Stdio,
    /// HTTP transport, JSON-RPC over `POST /mcp`
    Http { addr: SocketAddr },
}

/// MCP server exposing the operations of one OpenAPI document as tools.
///
/// Every instance owns its own tool table and handler; nothing is shared
/// between servers built from the same document.
#[derive(Debug)]
pub struct McpServer {
    name: String,
    client: BackendClient,
    registry: Arc<ToolRegistry>,
    handler: Arc<RequestHandler>,
    mode: ServerMode,
}

impl McpServer {
    /// Build a server from an in-memory OpenAPI document.
    ///
    /// Fails if the document is not a usable OpenAPI 3.x description. The
    /// backend is not contacted.
    pub fn from_openapi(
        document: &Value,
        client: BackendClient,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let spec = OpenApiParser::from_value(document)?;
        let registry = Arc::new(ToolRegistry::from_spec(&spec));

        info!(
            "Built MCP server {} from {} v{}: {} tools, backend {}",
            name,
            spec.title,
            spec.version,
            registry.len(),
            client.base_url()
        );

        let instructions = spec.description.clone().unwrap_or_else(|| {
            format!(
                "Tools for {} (v{}). Each tool calls one HTTP endpoint.",
                spec.title, spec.version
            )
        });
        let executor = ToolExecutor::new(client.clone(), registry.clone());
        let handler = Arc::new(RequestHandler::new(
            name.clone(),
            registry.clone(),
            executor,
            Some(instructions),
        ));

        Ok(Self {
            name,
            client,
            registry,
            handler,
            mode: ServerMode::default(),
        })
    }

    /// Set the server mode
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// Backend client tool calls are sent through
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn handler(&self) -> Arc<RequestHandler> {
        self.handler.clone()
    }

    /// Run the server until its transport finishes
    pub async fn run(&self) -> Result<()> {
        match self.mode {
            ServerMode::Stdio => {
                info!("Starting MCP server {} in stdio mode", self.name);
                StdioTransport::new(self.handler.clone()).run().await
            }
            ServerMode::Http { addr } => {
                info!("Starting MCP server {} in HTTP mode on {}", self.name, addr);
                HttpTransport::new(self.handler.clone(), addr).run().await
            }
        }
    }
}

//! MCP request handler

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::capabilities::ServerCapabilities;
use super::types::*;
use crate::error::ServerError;
use crate::tools::{ToolExecutor, ToolRegistry};

/// Dispatches JSON-RPC messages to the tool registry and executor.
///
/// Takes `&self` everywhere so a single handler can serve concurrent
/// requests from the HTTP transport.
#[derive(Debug)]
pub struct RequestHandler {
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    server_info: ServerInfo,
    instructions: Option<String>,
    initialized: AtomicBool,
}

fn parse_params<T: DeserializeOwned + Default>(params: Option<Value>) -> Result<T, McpError> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| McpError::invalid_params(e.to_string())),
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::internal_error(e.to_string()))
}

impl RequestHandler {
    pub fn new(
        name: impl Into<String>,
        registry: Arc<ToolRegistry>,
        executor: ToolExecutor,
        instructions: Option<String>,
    ) -> Self {
        Self {
            registry,
            executor,
            server_info: ServerInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether a client has completed `initialize`
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Handle an incoming message; returns the response for requests
    pub async fn handle(&self, message: McpMessage) -> Option<McpMessage> {
        if message.is_request() {
            let id = message.id.clone().unwrap_or(Value::Null);
            let method = message.method.as_deref().unwrap_or_default();

            debug!("Handling request: {}", method);

            let result = match method {
                "initialize" => self.handle_initialize(message.params),
                "ping" => Ok(serde_json::json!({})),
                "tools/list" => to_result(ToolsListResult {
                    tools: self.registry.list(),
                }),
                "tools/call" => self.handle_tools_call(message.params).await,
                other => Err(McpError::method_not_found(other)),
            };

            Some(match result {
                Ok(result) => McpMessage::response(id, result),
                Err(error) => McpMessage::error_response(Some(id), error),
            })
        } else if message.is_notification() {
            let method = message.method.as_deref().unwrap_or_default();
            match method {
                "notifications/initialized" | "initialized" => info!("Client initialized"),
                "notifications/cancelled" => debug!("Request cancelled"),
                other => debug!("Unknown notification: {}", other),
            }
            None
        } else if message.is_response() {
            debug!("Ignoring response message sent to server");
            None
        } else {
            Some(McpMessage::error_response(message.id, McpError::invalid_request()))
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: InitializeParams = parse_params(params)?;

        match &params.client_info {
            Some(client) => info!("Initializing session with client: {} v{}", client.name, client.version),
            None => info!("Initializing session with unnamed client"),
        }

        self.initialized.store(true, Ordering::Release);

        to_result(InitializeResult {
            protocol_version: negotiate_version(params.protocol_version.as_deref()).to_string(),
            capabilities: ServerCapabilities::with_tools(),
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string()))?
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        debug!("Calling tool: {}", params.name);

        match self.executor.execute(&params.name, params.arguments).await {
            Ok(tool_result) => to_result(tool_result),
            Err(ServerError::ToolNotFound(name)) => {
                Err(McpError::invalid_params(format!("Unknown tool: {name}")))
            }
            Err(e) => {
                error!("Tool {} failed: {}", params.name, e);
                to_result(ToolCallResult::error(e.to_string()))
            }
        }
    }
}

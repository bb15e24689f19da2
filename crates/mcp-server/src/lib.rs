//! # mcp-server
//!
//! MCP (Model Context Protocol) server that exposes the operations of an
//! OpenAPI document as tools and proxies tool calls to an HTTP backend.
//! Supports stdio and HTTP transports, plus a stdio-to-HTTP forwarder.

mod client;
mod error;
pub mod protocol;
mod server;
mod shutdown;
pub mod tools;
pub mod transport;

pub use client::BackendClient;
pub use error::{Result, ServerError};
pub use protocol::{McpError, McpMessage, RequestHandler, ServerCapabilities};
pub use server::{McpServer, ServerMode};
pub use tools::{ToolExecutor, ToolGenerator, ToolRegistry};
pub use transport::{HttpForwarder, HttpTransport, StdioTransport};

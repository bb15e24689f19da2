//! MCP protocol types and handling

mod types;
mod handler;
mod capabilities;

pub use types::*;
pub use handler::RequestHandler;
pub use capabilities::{ServerCapabilities, ToolsCapability};

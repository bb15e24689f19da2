//! MCP transports

mod forward;
mod http;
mod stdio;

pub use forward::{HttpForwarder, DEFAULT_FORWARD_URL};
pub use http::{HttpTransport, SESSION_HEADER};
pub use stdio::StdioTransport;

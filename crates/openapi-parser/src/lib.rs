//! # openapi-parser
//!
//! OpenAPI 3.x parser for the battle MCP bridge.
//! Extracts operations from OpenAPI documents and filters the routes tagged for MCP.

mod types;
mod parser;
mod operations;
mod resolver;
mod filter;
mod error;

pub use types::*;
pub use parser::OpenApiParser;
pub use operations::OperationExtractor;
pub use resolver::RefResolver;
pub use filter::{filter_document, untagged_operations, DEFAULT_MCP_TAG};
pub use error::{ParseError, ParseResult};

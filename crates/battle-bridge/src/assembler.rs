//! Builds the tool server from configuration

use mcp_server::McpServer;
use openapi_parser::{filter_document, untagged_operations};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::create_backend_client;
use crate::config::{BridgeConfig, TagPolicy};
use crate::error::Result;
use crate::loader::load_openapi_spec;

/// Load the document, build the backend client, and hand both to the
/// framework. The returned server is configured but not yet running.
pub fn create_mcp_server(config: &BridgeConfig) -> Result<McpServer> {
    let document = load_openapi_spec(&config.spec_path)?;
    info!("Loaded OpenAPI spec from {}", config.spec_path.display());

    let document = apply_tag_policy(document, config.tag_policy, &config.tag);
    let client = create_backend_client(config)?;
    let server = McpServer::from_openapi(&document, client, config.name.clone())?;

    Ok(server.with_mode(config.server_mode()))
}

/// Apply `policy` to operations that lack `tag`
pub fn apply_tag_policy(document: Value, policy: TagPolicy, tag: &str) -> Value {
    match policy {
        TagPolicy::Trust => document,
        TagPolicy::Warn => {
            for (method, path) in untagged_operations(&document, tag) {
                warn!("{} {} is not tagged '{}' but will be exposed as a tool", method, path, tag);
            }
            document
        }
        TagPolicy::Enforce => {
            let untagged = untagged_operations(&document, tag);
            if !untagged.is_empty() {
                info!("Dropping {} operations not tagged '{}'", untagged.len(), tag);
            }
            filter_document(&document, tag)
        }
    }
}

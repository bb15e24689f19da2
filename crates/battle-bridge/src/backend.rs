//! Backend HTTP client construction

use mcp_server::{BackendClient, ServerError};

use crate::config::BridgeConfig;

/// Client for the battle manager backend. Opens no connection.
pub fn create_backend_client(config: &BridgeConfig) -> Result<BackendClient, ServerError> {
    BackendClient::new(&config.base_url, config.timeout)
}

//! HTTP transport for MCP

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::protocol::{McpError, McpMessage, RequestHandler};
use crate::shutdown::shutdown_signal;

/// Session header returned with the `initialize` response
pub const SESSION_HEADER: &str = "mcp-session-id";

/// HTTP transport for MCP protocol
pub struct HttpTransport {
    handler: Arc<RequestHandler>,
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(handler: Arc<RequestHandler>, addr: SocketAddr) -> Self {
        Self { handler, addr }
    }

    /// Router serving `POST /mcp` and the health endpoints
    pub fn router(handler: Arc<RequestHandler>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

        Router::new()
            .route("/", get(health))
            .route("/health", get(health))
            .route("/mcp", post(handle_mcp_request))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(handler)
    }

    /// Bind the configured address and serve until the process is signalled
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.to_string(),
                source,
            })?;
        Self::serve(self.handler.clone(), listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves, then
    /// let in-flight requests finish
    pub async fn serve<S>(handler: Arc<RequestHandler>, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!("Starting MCP HTTP server on {}", listener.local_addr()?);
        axum::serve(listener, Self::router(handler))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("MCP HTTP server stopped");
        Ok(())
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Handle MCP JSON-RPC request via HTTP POST
async fn handle_mcp_request(State(handler): State<Arc<RequestHandler>>, body: Bytes) -> Response {
    let message: McpMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!("Rejecting malformed MCP request body: {}", e);
            let response = McpMessage::error_response(None, McpError::parse_error());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };
    debug!("HTTP request: {:?}", message.method);

    let is_initialize = message.is_request() && message.method.as_deref() == Some("initialize");

    match handler.handle(message).await {
        Some(response) => {
            let mut http_response = Json(response).into_response();
            if is_initialize {
                let session = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&session) {
                    http_response
                        .headers_mut()
                        .insert(HeaderName::from_static(SESSION_HEADER), value);
                }
            }
            http_response
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

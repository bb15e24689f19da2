//! stdio-to-HTTP forwarder for clients that only speak stdio

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::{Result, ServerError};
use crate::protocol::{McpError, McpMessage};
use crate::shutdown::shutdown_signal;

/// Default HTTP MCP endpoint forwarded to
pub const DEFAULT_FORWARD_URL: &str = "http://localhost:8001/mcp";

/// Reads JSON-RPC lines on stdin, POSTs each to an HTTP MCP endpoint, and
/// writes the responses to stdout.
pub struct HttpForwarder {
    client: Client,
    url: String,
}

impl HttpForwarder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServerError::ClientBuild)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Forward the process's stdin/stdout until stdin closes or the process
    /// is signalled
    pub async fn run(&self) -> Result<()> {
        info!("MCP stdio-to-HTTP forwarder starting, forwarding to {}", self.url);
        let shutdown = shutdown_signal();
        tokio::select! {
            result = self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => result,
            _ = shutdown => Ok(()),
        }
    }

    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                info!("stdin closed, forwarder shutting down");
                break;
            }

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let message: McpMessage = match serde_json::from_slice(&line) {
                Ok(message) => message,
                Err(e) => {
                    error!(
                        "Error processing message: {}; line was: {}",
                        e,
                        String::from_utf8_lossy(&line).trim_end()
                    );
                    continue;
                }
            };

            debug!(
                "Received: {} (id: {:?})",
                message.method.as_deref().unwrap_or("response"),
                message.id
            );

            if let Some(response) = self.forward(message).await {
                let out = serde_json::to_string(&response)?;
                writer.write_all(out.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Forward one message; returns what should be written back, if anything
    async fn forward(&self, message: McpMessage) -> Option<McpMessage> {
        let id = message.id.clone();
        let expects_response = message.is_request();

        let failure = match self.client.post(&self.url).json(&message).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if status.is_success() {
                    if status == StatusCode::ACCEPTED || body.trim().is_empty() {
                        return None;
                    }
                    match serde_json::from_str::<McpMessage>(&body) {
                        Ok(reply) => return expects_response.then_some(reply),
                        Err(e) => format!("Invalid response from MCP server: {e}"),
                    }
                } else {
                    let detail = serde_json::from_str::<McpMessage>(&body)
                        .ok()
                        .and_then(|m| m.error)
                        .map(|e| e.message)
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
                    error!("HTTP error from MCP server: {} {}", status, body);
                    format!("HTTP {}: {}", status.as_u16(), detail)
                }
            }
            Err(e) => {
                error!("Failed to reach MCP server: {}", e);
                e.to_string()
            }
        };

        expects_response.then(|| McpMessage::error_response(id, McpError::internal_error(failure)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, response::IntoResponse, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn upstream() -> String {
        let app = Router::new().route(
            "/mcp",
            post(|Json(message): Json<McpMessage>| async move {
                match (message.id, message.method.as_deref()) {
                    (None, _) => AxumStatus::ACCEPTED.into_response(),
                    (Some(id), Some("ping")) => {
                        Json(McpMessage::response(id, json!({}))).into_response()
                    }
                    (Some(id), _) => (
                        AxumStatus::BAD_REQUEST,
                        Json(McpMessage::error_response(
                            Some(id),
                            McpError::method_not_found("nope"),
                        )),
                    )
                        .into_response(),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/mcp")
    }

    async fn run(url: &str, input: &str) -> Vec<Value> {
        forward_bytes(url, input.as_bytes()).await
    }

    async fn forward_bytes(url: &str, input: &[u8]) -> Vec<Value> {
        let forwarder = HttpForwarder::new(url, Duration::from_secs(5)).unwrap();
        let mut output = Vec::new();
        forwarder.serve(input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_forwards_requests_and_drops_notifications() {
        let url = upstream().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            "\n",
            "not json\n",
        );

        let lines = run(&url, input).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], 7);
        assert_eq!(lines[0]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_http_error_becomes_internal_error() {
        let url = upstream().await;
        let lines = run(&url, "{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"bogus\"}\n").await;

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], 8);
        assert_eq!(lines[0]["error"]["code"], McpError::INTERNAL_ERROR);
        let message = lines[0]["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("HTTP 400"));
        assert!(message.contains("Method not found"));
    }

    #[tokio::test]
    async fn test_unreachable_server_answers_requests_with_error() {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/mcp", closed.local_addr().unwrap());
        drop(closed);

        let lines = run(&url, "{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n").await;
        assert_eq!(lines[0]["error"]["code"], McpError::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let url = upstream().await;
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":10,\"method\":\"ping\"}\n");

        let lines = forward_bytes(&url, &input).await;

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], 10);
    }
}

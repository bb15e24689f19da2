//! stdio transport for MCP (newline-delimited JSON-RPC)

use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::protocol::{McpError, McpMessage, RequestHandler};
use crate::shutdown::shutdown_signal;

/// stdio transport for MCP protocol.
///
/// stdout carries protocol messages only; all logging goes through `tracing`.
pub struct StdioTransport {
    handler: Arc<RequestHandler>,
}

async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &McpMessage) -> Result<()> {
    let line = serde_json::to_string(message)?;
    debug!("Sending: {}", line);
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

impl StdioTransport {
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self { handler }
    }

    /// Serve on the process's stdin/stdout until stdin closes or the
    /// process is signalled
    pub async fn run(&self) -> Result<()> {
        info!("Starting MCP server on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve_until(stdin, stdout, shutdown_signal()).await
    }

    /// Serve until EOF or until `shutdown` resolves, whichever comes first
    pub async fn serve_until<R, W, S>(&self, reader: R, writer: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = self.serve(reader, writer) => result,
            _ = shutdown => {
                info!("Shutdown requested, stopping stdio transport");
                Ok(())
            }
        }
    }

    /// Serve over any line-oriented reader/writer pair until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();

        loop {
            line.clear();

            let bytes_read = reader.read_until(b'\n', &mut line).await?;
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            debug!("Received: {}", String::from_utf8_lossy(&line).trim_end());

            let message: McpMessage = match serde_json::from_slice(&line) {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let response = McpMessage::error_response(None, McpError::parse_error());
                    write_message(&mut writer, &response).await?;
                    continue;
                }
            };

            if let Some(response) = self.handler.handle(message).await {
                write_message(&mut writer, &response).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BackendClient;
    use crate::tools::{ToolExecutor, ToolRegistry};
    use openapi_parser::OpenApiParser;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn transport() -> StdioTransport {
        let spec = OpenApiParser::from_value(&json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/api/dice/roll": {"post": {"operationId": "rollDice"}}}
        }))
        .unwrap();
        let registry = Arc::new(ToolRegistry::from_spec(&spec));
        let client = BackendClient::new("http://localhost:8000", Duration::from_secs(30)).unwrap();
        let executor = ToolExecutor::new(client, registry.clone());
        StdioTransport::new(Arc::new(RequestHandler::new("test", registry, executor, None)))
    }

    #[tokio::test]
    async fn test_serves_until_eof() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();

        transport().serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[0]["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(lines[1]["result"]["tools"][0]["name"], "rollDice");
    }

    #[tokio::test]
    async fn test_malformed_line_gets_parse_error() {
        let mut output = Vec::new();

        transport().serve("{\n".as_bytes(), &mut output).await.unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["error"]["code"], McpError::PARSE_ERROR);
        assert!(response.as_object().unwrap().contains_key("id"));
        assert_eq!(response["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_serving() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        transport().serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], McpError::PARSE_ERROR);
        assert_eq!(lines[1]["id"], 3);
        assert_eq!(lines[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_transport() {
        // The client end stays open, so only the shutdown future can end serving
        let (_client, server) = tokio::io::duplex(64);
        let (read_half, _write_half) = tokio::io::split(server);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut output = Vec::new();

        let transport = transport();
        let serving = transport.serve_until(BufReader::new(read_half), &mut output, async {
            let _ = rx.await;
        });
        tx.send(()).unwrap();

        serving.await.unwrap();
        assert!(output.is_empty());
    }
}

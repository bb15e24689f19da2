//! Execute MCP tools by making HTTP requests to the backend

use openapi_parser::{HttpMethod, ParameterLocation};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::generator::ArgumentTarget;
use super::registry::{RegisteredTool, ToolRegistry};
use crate::client::BackendClient;
use crate::error::{Result, ServerError};
use crate::protocol::ToolCallResult;

/// Executor for MCP tools
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    client: BackendClient,
    registry: Arc<ToolRegistry>,
}

/// The parts of an HTTP request assembled from tool arguments
#[derive(Debug, Default)]
struct RequestParts {
    path_values: Vec<(String, String)>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body_fields: Map<String, Value>,
    body: Option<Value>,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute `{name}` placeholders in one path segment. Values are inserted
/// as-is and never rescanned. Returns `None` if a placeholder has no value.
fn fill_segment(segment: &str, path_values: &[(String, String)]) -> Option<String> {
    let mut filled = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        filled.push_str(&rest[..open]);
        let name = &rest[open + 1..close];
        let (_, value) = path_values.iter().find(|(n, _)| n == name)?;
        filled.push_str(value);
        rest = &rest[close + 1..];
    }
    filled.push_str(rest);
    Some(filled)
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Trace => Method::TRACE,
    }
}

impl ToolExecutor {
    pub fn new(client: BackendClient, registry: Arc<ToolRegistry>) -> Self {
        Self { client, registry }
    }

    /// Execute a tool by name.
    ///
    /// Backend HTTP error statuses are reported as error results; only unknown
    /// tools, unusable arguments, and transport failures return `Err`.
    pub async fn execute(&self, tool_name: &str, arguments: Option<Value>) -> Result<ToolCallResult> {
        let registered = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ServerError::ToolNotFound(tool_name.to_string()))?;

        let args = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ServerError::InvalidArguments(
                    "arguments must be an object".to_string(),
                ))
            }
        };

        let missing: Vec<&str> = registered
            .tool
            .input_schema
            .required
            .iter()
            .filter(|name| args.get(name.as_str()).map_or(true, Value::is_null))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ServerError::InvalidArguments(format!(
                "missing required arguments: {}",
                missing.join(", ")
            )));
        }

        let parts = Self::bind_arguments(registered, args);
        self.send(registered, parts).await
    }

    fn bind_arguments(registered: &RegisteredTool, mut args: Map<String, Value>) -> RequestParts {
        let mut parts = RequestParts::default();

        for binding in &registered.bindings {
            let Some(value) = args.remove(&binding.argument) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match &binding.target {
                ArgumentTarget::Parameter { name, location } => match location {
                    ParameterLocation::Path => {
                        parts.path_values.push((name.clone(), value_to_string(&value)));
                    }
                    ParameterLocation::Query => match value {
                        Value::Array(items) => parts
                            .query
                            .extend(items.iter().map(|item| (name.clone(), value_to_string(item)))),
                        other => parts.query.push((name.clone(), value_to_string(&other))),
                    },
                    ParameterLocation::Header => {
                        parts.headers.push((name.clone(), value_to_string(&value)));
                    }
                    ParameterLocation::Cookie => {}
                },
                ArgumentTarget::BodyField(field) => {
                    parts.body_fields.insert(field.clone(), value);
                }
                ArgumentTarget::Body => parts.body = Some(value),
            }
        }

        // Undeclared arguments ride along in an object body
        let object_body = registered
            .operation
            .request_body
            .as_ref()
            .is_some_and(|b| b.object_properties().is_some());
        for (key, value) in args {
            if object_body {
                parts.body_fields.insert(key, value);
            } else {
                debug!("Ignoring undeclared argument {} for {}", key, registered.tool.name);
            }
        }

        parts
    }

    fn build_url(&self, path: &str, path_values: &[(String, String)]) -> Result<url::Url> {
        let mut segments = Vec::new();
        for template in path.split('/').filter(|s| !s.is_empty()) {
            let segment = fill_segment(template, path_values).ok_or_else(|| {
                ServerError::InvalidArguments(format!("unresolved path parameter in {template}"))
            })?;
            segments.push(segment);
        }
        Ok(self.client.endpoint(segments.iter().map(String::as_str)))
    }

    async fn send(&self, registered: &RegisteredTool, parts: RequestParts) -> Result<ToolCallResult> {
        let operation = &registered.operation;
        let url = self.build_url(&operation.path, &parts.path_values)?;
        let method = to_reqwest_method(operation.method);

        let mut request = self.client.request(method.clone(), url.clone());
        if !parts.query.is_empty() {
            request = request.query(&parts.query);
        }
        for (name, value) in &parts.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let body = match (&operation.request_body, parts.body) {
            (Some(_), Some(body)) => Some(body),
            (Some(declared), None) if !parts.body_fields.is_empty() || declared.required => {
                Some(Value::Object(parts.body_fields))
            }
            _ => None,
        };
        if let Some(body) = &body {
            request = request.json(body);
        }

        info!("Executing {} {} for tool {}", method, url, registered.tool.name);

        let response = request.send().await.map_err(ServerError::Backend)?;
        let status = response.status();
        let response_text = response.text().await.map_err(ServerError::Backend)?;

        debug!("Response status: {}", status);

        if status.is_success() {
            if response_text.trim().is_empty() {
                return Ok(ToolCallResult::text(format!("HTTP {status}")));
            }
            Ok(match serde_json::from_str::<Value>(&response_text) {
                Ok(json) => ToolCallResult::json(json),
                Err(_) => ToolCallResult::text(response_text),
            })
        } else {
            warn!("Request failed with status {}: {}", status, response_text);
            Ok(ToolCallResult::error(format!("HTTP {} - {}", status, response_text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post, put},
        Json, Router,
    };
    use openapi_parser::OpenApiParser;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn battle_spec() -> Value {
        json!({
            "openapi": "3.1.0",
            "info": {"title": "D&D Battle Manager API", "version": "1.0.0"},
            "paths": {
                "/api/battles/{battleId}": {
                    "get": {
                        "operationId": "getBattle",
                        "parameters": [
                            {"name": "battleId", "in": "path", "required": true, "schema": {"type": "string"}},
                            {"name": "include", "in": "query", "schema": {"type": "array", "items": {"type": "string"}}},
                            {"name": "X-Request-Source", "in": "header", "schema": {"type": "string"}}
                        ]
                    }
                },
                "/api/battles/{battleId}/creatures": {
                    "post": {
                        "operationId": "addCreature",
                        "parameters": [{"name": "battleId", "in": "path", "required": true}],
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"name": {"type": "string"}, "hp": {"type": "integer"}},
                                "required": ["name"]
                            }}}
                        }
                    }
                },
                "/api/creatures/{id}": {
                    "put": {
                        "operationId": "updateCreature",
                        "parameters": [{"name": "id", "in": "path", "required": true}],
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"id": {"type": "integer"}, "name": {"type": "string"}},
                                "required": ["id", "name"]
                            }}}
                        }
                    }
                },
                "/api/battles/{battleId}/fail": {
                    "post": {
                        "operationId": "failBattle",
                        "parameters": [{"name": "battleId", "in": "path", "required": true}]
                    }
                }
            }
        })
    }

    async fn mock_backend() -> String {
        let app = Router::new()
            .route(
                "/api/battles/:battle_id",
                get(
                    |Path(battle_id): Path<String>,
                     Query(query): Query<Vec<(String, String)>>,
                     headers: HeaderMap| async move {
                        let include: Vec<String> = query.into_iter().map(|(_, v)| v).collect();
                        let source = headers
                            .get("x-request-source")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        Json(json!({"id": battle_id, "include": include, "source": source}))
                    },
                ),
            )
            .route(
                "/api/battles/:battle_id/creatures",
                post(|Path(battle_id): Path<String>, Json(body): Json<HashMap<String, Value>>| async move {
                    Json(json!({"battle": battle_id, "received": body}))
                }),
            )
            .route(
                "/api/creatures/:creature_id",
                put(|Path(creature_id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({"creature": creature_id, "received": body}))
                }),
            )
            .route(
                "/api/battles/:battle_id/fail",
                post(|| async { (StatusCode::NOT_FOUND, "Battle not found") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn executor(base_url: &str) -> ToolExecutor {
        let spec = OpenApiParser::from_value(&battle_spec()).unwrap();
        let client = BackendClient::new(base_url, Duration::from_secs(5)).unwrap();
        ToolExecutor::new(client, Arc::new(ToolRegistry::from_spec(&spec)))
    }

    #[tokio::test]
    async fn test_path_query_and_header_arguments() {
        let executor = executor(&mock_backend().await);

        let result = executor
            .execute(
                "getBattle",
                Some(json!({
                    "battleId": "goblin ambush",
                    "include": ["creatures", "map"],
                    "X-Request-Source": "mcp"
                })),
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["id"], "goblin ambush");
        assert_eq!(structured["include"], json!(["creatures", "map"]));
        assert_eq!(structured["source"], "mcp");
    }

    #[tokio::test]
    async fn test_body_arguments_are_sent_as_json() {
        let executor = executor(&mock_backend().await);

        let result = executor
            .execute(
                "addCreature",
                Some(json!({"battleId": "b1", "name": "Goblin", "hp": 7, "size": "Small"})),
            )
            .await
            .unwrap();

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["battle"], "b1");
        assert_eq!(structured["received"], json!({"name": "Goblin", "hp": 7, "size": "Small"}));
    }

    #[tokio::test]
    async fn test_error_status_becomes_error_result() {
        let executor = executor(&mock_backend().await);

        let result = executor
            .execute("failBattle", Some(json!({"battleId": "b1"})))
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.text_content().contains("404"));
        assert!(result.text_content().contains("Battle not found"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let executor = executor("http://127.0.0.1:9");

        let err = executor
            .execute("addCreature", Some(json!({"battleId": "b1"})))
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::InvalidArguments(msg) if msg.contains("name")));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = executor("http://127.0.0.1:9");
        let err = executor.execute("deleteEverything", None).await.unwrap_err();
        assert!(matches!(err, ServerError::ToolNotFound(name) if name == "deleteEverything"));
    }

    #[tokio::test]
    async fn test_non_object_arguments_are_rejected() {
        let executor = executor("http://127.0.0.1:9");
        let err = executor
            .execute("getBattle", Some(json!(["b1"])))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_backend_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = executor(&format!("http://{addr}"));
        let err = executor
            .execute("getBattle", Some(json!({"battleId": "b1"})))
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Backend(_)));
    }

    #[tokio::test]
    async fn test_body_field_sharing_a_parameter_name_is_sent() {
        let executor = executor(&mock_backend().await);

        let result = executor
            .execute(
                "updateCreature",
                Some(json!({"id": "c1", "id__body": 5, "name": "Orc"})),
            )
            .await
            .unwrap();

        let structured = result.structured_content.unwrap();
        assert_eq!(structured["creature"], "c1");
        assert_eq!(structured["received"], json!({"id": 5, "name": "Orc"}));

        let err = executor
            .execute("updateCreature", Some(json!({"id": "c1", "name": "Orc"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidArguments(msg) if msg.contains("id__body")));
    }

    #[tokio::test]
    async fn test_braces_in_path_values_are_sent_literally() {
        let executor = executor(&mock_backend().await);

        let result = executor
            .execute("getBattle", Some(json!({"battleId": "{weird}"})))
            .await
            .unwrap();

        assert!(!result.is_error());
        assert_eq!(result.structured_content.unwrap()["id"], "{weird}");
    }

    #[test]
    fn test_fill_segment_substitutes_once() {
        let values = vec![
            ("a".to_string(), "{b}".to_string()),
            ("b".to_string(), "x".to_string()),
        ];

        assert_eq!(fill_segment("{a}-{b}", &values).as_deref(), Some("{b}-x"));
        assert_eq!(fill_segment("battles", &values).as_deref(), Some("battles"));
        assert_eq!(fill_segment("{missing}", &values), None);
    }
}

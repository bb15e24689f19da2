//! Main OpenAPI parser

use crate::error::{ParseError, ParseResult};
use crate::operations::OperationExtractor;
use crate::resolver::RefResolver;
use crate::types::*;
use serde_json::Value;
use tracing::debug;

/// OpenAPI 3.x parser
pub struct OpenApiParser;

impl OpenApiParser {
    /// Parse an OpenAPI spec from JSON text
    pub fn parse_json(content: &str) -> ParseResult<ParsedSpec> {
        let document: Value = serde_json::from_str(content)?;
        Self::from_value(&document)
    }

    /// Parse an already-decoded OpenAPI document
    pub fn from_value(document: &Value) -> ParseResult<ParsedSpec> {
        let root = document.as_object().ok_or(ParseError::NotAnObject)?;

        let version = root
            .get("openapi")
            .ok_or(ParseError::MissingField("openapi"))?
            .as_str()
            .ok_or(ParseError::WrongType {
                field: "openapi",
                expected: "a version string",
            })?;
        if !version.starts_with("3.") {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }
        if !root.contains_key("info") {
            return Err(ParseError::MissingField("info"));
        }

        let raw: RawOpenApiSpec = serde_json::from_value(document.clone())?;
        Ok(Self::convert_spec(raw, &RefResolver::new(document)))
    }

    /// Convert a raw OpenAPI spec to our internal format
    fn convert_spec(raw: RawOpenApiSpec, resolver: &RefResolver) -> ParsedSpec {
        debug!("Parsing OpenAPI {} spec: {}", raw.openapi, raw.info.title);

        let operations = OperationExtractor::extract(&raw, resolver);

        debug!("Extracted {} operations", operations.len());

        ParsedSpec {
            title: raw.info.title,
            description: raw.info.description,
            version: raw.info.version,
            operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_SPEC: &str = r#"{
  "openapi": "3.1.0",
  "info": {
    "title": "D&D Battle Manager API",
    "version": "1.0.0",
    "description": "Battle management with MCP support"
  },
  "servers": [{"url": "http://localhost:8000", "description": "Local development server"}],
  "paths": {
    "/api/battles": {
      "get": {
        "operationId": "listBattles",
        "summary": "List all battles",
        "tags": ["mcp"],
        "responses": {"200": {"description": "Battles"}}
      },
      "post": {
        "operationId": "createBattle",
        "summary": "Create a battle",
        "tags": ["mcp"],
        "requestBody": {
          "required": true,
          "content": {
            "application/json": {
              "schema": {
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
              }
            }
          }
        },
        "responses": {"200": {"description": "Created"}}
      }
    },
    "/api/battles/{id}": {
      "get": {
        "operationId": "getBattle",
        "summary": "Get a battle by ID",
        "tags": ["mcp"],
        "parameters": [
          {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}
        ],
        "responses": {"200": {"description": "A battle"}}
      }
    }
  }
}"#;

    #[test]
    fn test_parse_json() {
        let spec = OpenApiParser::parse_json(SAMPLE_SPEC).unwrap();

        assert_eq!(spec.title, "D&D Battle Manager API");
        assert_eq!(spec.version, "1.0.0");
        assert_eq!(spec.operations.len(), 3);
    }

    #[test]
    fn test_parse_extracts_operations() {
        let spec = OpenApiParser::parse_json(SAMPLE_SPEC).unwrap();

        let list = spec.operations.iter()
            .find(|op| op.operation_id == "listBattles")
            .unwrap();
        assert_eq!(list.method, HttpMethod::Get);
        assert_eq!(list.path, "/api/battles");
        assert!(list.has_tag("mcp"));

        let create = spec.operations.iter()
            .find(|op| op.operation_id == "createBattle")
            .unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert!(create.request_body.is_some());

        let get = spec.operations.iter()
            .find(|op| op.operation_id == "getBattle")
            .unwrap();
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].name, "id");
    }

    #[test]
    fn test_rejects_swagger_2() {
        let doc = json!({"openapi": "2.0", "info": {"title": "t", "version": "1"}});
        let err = OpenApiParser::from_value(&doc).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_rejects_missing_fields() {
        let err = OpenApiParser::from_value(&json!({"info": {}})).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "openapi"));

        let err = OpenApiParser::from_value(&json!({"openapi": "3.1.0"})).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "info"));

        let err = OpenApiParser::from_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject));

        let err = OpenApiParser::from_value(&json!({"openapi": 3.1})).unwrap_err();
        assert!(matches!(err, ParseError::WrongType { field: "openapi", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = OpenApiParser::parse_json("{").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn test_empty_paths() {
        let doc = json!({"openapi": "3.0.0", "info": {"title": "t", "version": "1"}});
        let spec = OpenApiParser::from_value(&doc).unwrap();
        assert!(spec.operations.is_empty());
    }
}

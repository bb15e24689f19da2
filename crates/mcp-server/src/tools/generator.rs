//! Generate MCP tools from OpenAPI operations

use crate::protocol::{McpInputSchema, McpTool};
use openapi_parser::{ApiOperation, OperationParameter, ParameterLocation, RequestBody};
use serde_json::{json, Map, Value};

/// Header parameters never exposed as tool arguments
const SKIPPED_HEADERS: [&str; 3] = ["authorization", "x-api-key", "api-key"];

/// Argument name used when the request body is not an object with properties
pub const WHOLE_BODY_ARGUMENT: &str = "body";

/// Where a tool argument goes in the outgoing HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentTarget {
    /// A path, query, or header parameter
    Parameter {
        name: String,
        location: ParameterLocation,
    },
    /// A top-level property of a JSON object body
    BodyField(String),
    /// The entire request body
    Body,
}

/// Binds a tool argument name to its place in the HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentBinding {
    pub argument: String,
    pub target: ArgumentTarget,
}

/// A tool together with the bindings needed to execute it
#[derive(Debug, Clone)]
pub struct GeneratedTool {
    pub tool: McpTool,
    pub bindings: Vec<ArgumentBinding>,
}

/// Sanitize a property name to match the pattern `^[a-zA-Z0-9_.-]{1,64}$`
fn sanitize_property_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();

    if sanitized.is_empty() {
        "param".to_string()
    } else {
        sanitized
    }
}

/// Derive a tool name (`^[a-zA-Z0-9_-]{1,64}$`) from an operation ID
pub fn tool_name(operation_id: &str) -> String {
    let name: String = operation_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect();

    if name.is_empty() {
        "tool".to_string()
    } else {
        name
    }
}

/// Generator for MCP tools from OpenAPI operations
#[derive(Debug, Default)]
pub struct ToolGenerator;

/// Accumulates the input schema and bindings of a single tool
#[derive(Default)]
struct SchemaBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
    bindings: Vec<ArgumentBinding>,
}

impl SchemaBuilder {
    /// Insert a property. A name that is already taken is kept under
    /// `{name}__{location}` so both values can still be sent.
    fn insert(
        &mut self,
        name: String,
        location: &str,
        schema: Value,
        required: bool,
        target: ArgumentTarget,
    ) {
        let mut argument = name;
        if self.properties.contains_key(&argument) {
            let base = format!("{argument}__{location}");
            argument = base.clone();
            let mut n = 2;
            while self.properties.contains_key(&argument) {
                argument = format!("{base}{n}");
                n += 1;
            }
        }

        self.properties.insert(argument.clone(), schema);
        if required {
            self.required.push(argument.clone());
        }
        self.bindings.push(ArgumentBinding { argument, target });
    }
}

impl ToolGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a single MCP tool from an operation
    pub fn generate_tool(&self, operation: &ApiOperation) -> GeneratedTool {
        let mut builder = SchemaBuilder::default();

        for location in [ParameterLocation::Path, ParameterLocation::Query] {
            for param in operation.parameters_in(location) {
                self.add_parameter(&mut builder, param);
            }
        }
        for param in operation.parameters_in(ParameterLocation::Header) {
            if !SKIPPED_HEADERS.contains(&param.name.to_lowercase().as_str()) {
                self.add_parameter(&mut builder, param);
            }
        }

        if let Some(body) = &operation.request_body {
            self.add_body(&mut builder, body);
        }

        GeneratedTool {
            tool: McpTool {
                name: tool_name(&operation.operation_id),
                description: Some(self.build_description(operation)),
                input_schema: McpInputSchema {
                    schema_type: "object".to_string(),
                    properties: builder.properties,
                    required: builder.required,
                },
            },
            bindings: builder.bindings,
        }
    }

    fn build_description(&self, operation: &ApiOperation) -> String {
        let mut parts = Vec::new();

        if let Some(summary) = &operation.summary {
            parts.push(summary.clone());
        }
        if let Some(desc) = &operation.description {
            if operation.summary.as_ref() != Some(desc) {
                parts.push(desc.clone());
            }
        }

        parts.push(format!("[{} {}]", operation.method, operation.path));

        if operation.deprecated {
            parts.push("(DEPRECATED)".to_string());
        }

        parts.join("\n\n")
    }

    fn add_parameter(&self, builder: &mut SchemaBuilder, param: &OperationParameter) {
        let mut prop = param
            .schema
            .as_ref()
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        if !prop.contains_key("type") && !prop.contains_key("anyOf") && !prop.contains_key("oneOf") {
            prop.insert("type".to_string(), json!("string"));
        }

        let (location, location_hint) = match param.location {
            ParameterLocation::Path => ("path", "(path parameter)"),
            ParameterLocation::Query => ("query", "(query parameter)"),
            ParameterLocation::Header => ("header", "(header)"),
            ParameterLocation::Cookie => ("cookie", "(cookie)"),
        };
        let desc = param
            .description
            .as_deref()
            .or_else(|| prop.get("description").and_then(Value::as_str))
            .unwrap_or("");
        let desc = format!("{} {}", desc, location_hint).trim().to_string();
        prop.insert("description".to_string(), json!(desc));

        if let Some(example) = &param.example {
            prop.insert("example".to_string(), example.clone());
        }

        builder.insert(
            sanitize_property_name(&param.name),
            location,
            Value::Object(prop),
            param.required,
            ArgumentTarget::Parameter {
                name: param.name.clone(),
                location: param.location,
            },
        );
    }

    fn add_body(&self, builder: &mut SchemaBuilder, body: &RequestBody) {
        let Some(body_props) = body.object_properties() else {
            let mut schema = body
                .schema
                .clone()
                .unwrap_or_else(|| json!({"type": "object"}));
            if let Some(obj) = schema.as_object_mut() {
                let desc = body.description.as_deref().unwrap_or("Request body");
                obj.entry("description").or_insert_with(|| json!(desc));
            }
            builder.insert(
                WHOLE_BODY_ARGUMENT.to_string(),
                "body",
                schema,
                body.required,
                ArgumentTarget::Body,
            );
            return;
        };

        let body_required: Vec<&str> = body
            .schema
            .as_ref()
            .and_then(|s| s.get("required"))
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        for (key, value) in body_props {
            let mut prop = value.clone();
            if let Some(obj) = prop.as_object_mut() {
                let desc = obj.get("description").and_then(Value::as_str).unwrap_or("");
                let desc = format!("{} (body)", desc).trim().to_string();
                obj.insert("description".to_string(), json!(desc));
            }

            // An optional body's required fields only bind once the body is sent.
            let required = body.required && body_required.contains(&key.as_str());
            builder.insert(
                sanitize_property_name(key),
                "body",
                prop,
                required,
                ArgumentTarget::BodyField(key.clone()),
            );
        }
    }
}

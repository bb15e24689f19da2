//! Tool table built once from a parsed spec

use indexmap::IndexMap;
use openapi_parser::{ApiOperation, ParsedSpec};
use tracing::{debug, warn};

use super::generator::{ArgumentBinding, ToolGenerator};
use crate::protocol::McpTool;

/// A tool and the operation it invokes
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub tool: McpTool,
    pub operation: ApiOperation,
    pub bindings: Vec<ArgumentBinding>,
}

/// Tools derived from an OpenAPI spec, keyed by tool name in spec order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Build one tool per operation in `spec`
    pub fn from_spec(spec: &ParsedSpec) -> Self {
        let generator = ToolGenerator::new();
        let mut registry = Self::default();

        for operation in &spec.operations {
            let generated = generator.generate_tool(operation);
            let name = registry.unique_name(&generated.tool.name);
            if name != generated.tool.name {
                warn!(
                    "Duplicate tool name {} for {} {}, registered as {}",
                    generated.tool.name, operation.method, operation.path, name
                );
            }

            let mut tool = generated.tool;
            tool.name = name.clone();
            debug!("Registered tool {} -> {} {}", name, operation.method, operation.path);
            registry.tools.insert(
                name,
                RegisteredTool {
                    tool,
                    operation: operation.clone(),
                    bindings: generated.bindings,
                },
            );
        }

        registry
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.tools.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| {
                let suffix = format!("_{n}");
                let keep = base.len().min(64 - suffix.len());
                format!("{}{}", &base[..keep], suffix)
            })
            .find(|candidate| !self.tools.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Tool definitions for `tools/list`
    pub fn list(&self) -> Vec<McpTool> {
        self.tools.values().map(|t| t.tool.clone()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_parser::OpenApiParser;
    use serde_json::json;

    #[test]
    fn test_registry_keeps_spec_order() {
        let spec = OpenApiParser::from_value(&json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/api/battles": {
                    "get": {"operationId": "listBattles"},
                    "post": {"operationId": "createBattle"}
                },
                "/api/dice/roll": {"post": {"operationId": "rollDice"}}
            }
        }))
        .unwrap();

        let registry = ToolRegistry::from_spec(&spec);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["listBattles", "createBattle", "rollDice"]);
        assert_eq!(registry.get("rollDice").unwrap().operation.path, "/api/dice/roll");
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let spec = OpenApiParser::from_value(&json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/a": {"get": {"operationId": "getThing"}},
                "/b": {"get": {"operationId": "getThing"}},
                "/c": {"get": {"operationId": "get.Thing"}}
            }
        }))
        .unwrap();

        let registry = ToolRegistry::from_spec(&spec);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("getThing").unwrap().operation.path, "/a");
        assert_eq!(registry.get("getThing_2").unwrap().operation.path, "/b");
        assert_eq!(registry.get("get_Thing").unwrap().operation.path, "/c");
        assert_eq!(registry.get("getThing_2").unwrap().tool.name, "getThing_2");
    }
}

//! Filtering an OpenAPI document down to the operations tagged for MCP

use crate::types::HttpMethod;
use serde_json::{Map, Value};

/// Tag that marks an operation for exposure as an MCP tool
pub const DEFAULT_MCP_TAG: &str = "mcp";

/// Top-level document keys carried over into a filtered document
const KEPT_ROOT_KEYS: [&str; 4] = ["openapi", "info", "servers", "components"];

/// Build a copy of `document` that only contains operations tagged with `tag`.
///
/// Paths left without any operation are dropped. Paths that keep at least one
/// operation also keep their path-level fields (`parameters`, `summary`, ...).
pub fn filter_document(document: &Value, tag: &str) -> Value {
    let mut filtered = Map::new();
    for key in KEPT_ROOT_KEYS {
        if let Some(value) = document.get(key) {
            filtered.insert(key.to_string(), value.clone());
        }
    }

    let mut paths = Map::new();
    if let Some(source_paths) = document.get("paths").and_then(Value::as_object) {
        for (path, path_item) in source_paths {
            let Some(item) = path_item.as_object() else {
                continue;
            };

            let mut kept = Map::new();
            let mut has_operation = false;
            for (key, value) in item {
                if HttpMethod::from_path_item_key(key).is_some() {
                    if operation_has_tag(value, tag) {
                        kept.insert(key.clone(), value.clone());
                        has_operation = true;
                    }
                } else {
                    kept.insert(key.clone(), value.clone());
                }
            }

            if has_operation {
                paths.insert(path.clone(), Value::Object(kept));
            }
        }
    }
    filtered.insert("paths".to_string(), Value::Object(paths));

    Value::Object(filtered)
}

/// List the operations of `document` that are missing `tag`, as `(method, path)` pairs
pub fn untagged_operations(document: &Value, tag: &str) -> Vec<(HttpMethod, String)> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    paths
        .iter()
        .filter_map(|(path, item)| item.as_object().map(|item| (path, item)))
        .flat_map(|(path, item)| {
            HttpMethod::ALL.into_iter().filter_map(move |method| {
                let operation = item.get(method.path_item_key())?;
                (!operation_has_tag(operation, tag)).then(|| (method, path.clone()))
            })
        })
        .collect()
}

fn operation_has_tag(operation: &Value, tag: &str) -> bool {
    operation
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(tag)))
}

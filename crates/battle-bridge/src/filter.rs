//! Regenerates the MCP-only OpenAPI document from the full one

use openapi_parser::{filter_document, HttpMethod};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use crate::error::{BridgeError, Result};
use crate::loader::load_openapi_spec;

/// Operation counts from a filter run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub total: usize,
    pub kept: usize,
}

fn count_operations(document: &Value) -> usize {
    document
        .get("paths")
        .and_then(Value::as_object)
        .map(|paths| {
            paths
                .values()
                .filter_map(Value::as_object)
                .flat_map(|item| item.keys())
                .filter(|key| HttpMethod::from_path_item_key(key).is_some())
                .count()
        })
        .unwrap_or(0)
}

/// Write the operations of `input` tagged `tag` to `output` as pretty JSON
pub fn filter_spec_file(input: &Path, output: &Path, tag: &str) -> Result<FilterReport> {
    let document = load_openapi_spec(input)?;
    let filtered = filter_document(&document, tag);

    let report = FilterReport {
        total: count_operations(&document),
        kept: count_operations(&filtered),
    };

    let mut text = serde_json::to_string_pretty(&filtered)?;
    text.push('\n');
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| BridgeError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output, text).map_err(|source| BridgeError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    info!(
        "Filtered {} -> {}: kept {} of {} operations tagged '{}'",
        input.display(),
        output.display(),
        report.kept,
        report.total,
        tag
    );
    Ok(report)
}

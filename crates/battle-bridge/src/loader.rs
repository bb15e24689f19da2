//! Reads the OpenAPI document from disk

use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::LoadError;

/// Read and parse the JSON document at `path`.
///
/// The document is returned as-is; whether it is valid OpenAPI is decided
/// when the server is built from it.
pub fn load_openapi_spec(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded OpenAPI spec from {} ({} bytes)", path.display(), text.len());
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_loads_document_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("openapi-mcp.json");
        std::fs::write(
            &path,
            r#"{"openapi":"3.1.0","info":{"title":"t","version":"1"},"paths":{},"x-extra":[1,2]}"#,
        )
        .unwrap();

        let document = load_openapi_spec(&path).unwrap();
        assert_eq!(document["x-extra"], serde_json::json!([1, 2]));
        assert_eq!(document["openapi"], "3.1.0");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_openapi_spec(dir.path().join("absent.json")).unwrap_err();

        match err {
            LoadError::Read { path, source } => {
                assert!(path.ends_with("absent.json"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"openapi\": ").unwrap();

        let err = load_openapi_spec(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}

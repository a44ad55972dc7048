//! Schema and payload files for the JSON validator

use serde_json::{json, Value};
use std::path::Path;

/// Read a JSON document from disk; failures become `{"error": "..."}`
pub fn load_schema_from_file(path: &Path) -> Value {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match loaded {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "Could not load JSON file");
            json!({ "error": error })
        }
    }
}

/// Build a validator request from a schema file and a payload file
pub fn validation_request(schema_path: &Path, payload_path: &Path) -> Value {
    json!({
        "schema": load_schema_from_file(schema_path),
        "payload": load_schema_from_file(payload_path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object", "required": ["name"]}"#).unwrap();

        let schema = load_schema_from_file(&path);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "name");
    }

    #[test]
    fn test_missing_file_yields_error_object() {
        let dir = TempDir::new().unwrap();
        let schema = load_schema_from_file(&dir.path().join("missing.json"));
        assert!(schema["error"].is_string());
    }

    #[test]
    fn test_malformed_file_yields_error_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(load_schema_from_file(&path)["error"].is_string());
    }

    #[test]
    fn test_validation_request_shape() {
        let dir = TempDir::new().unwrap();
        let schema = dir.path().join("schema.json");
        let payload = dir.path().join("payload.json");
        std::fs::write(&schema, r#"{"type": "object"}"#).unwrap();
        std::fs::write(&payload, r#"{"name": 123}"#).unwrap();

        let request = validation_request(&schema, &payload);
        assert_eq!(request["schema"]["type"], "object");
        assert_eq!(request["payload"]["name"], 123);
    }
}

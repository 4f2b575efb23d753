use std::io::Write;
use std::path::Path;

/// Write JSON to stdout or a file, creating missing parent directories.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create directory '{}': {}", parent.display(), e)
                })?;
            }
            std::fs::write(path, json)
                .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e))
        }
        None => write_line(json),
    }
}

/// Write one line to stdout (JSONL records, listings).
pub fn write_line(line: &str) -> Result<(), String> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(line.as_bytes())
        .and_then(|_| handle.write_all(b"\n"))
        .map_err(|e| format!("Failed to write to stdout: {}", e))
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let result = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    result.map_err(|e| format!("JSON serialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_compact_and_pretty() {
        let value = serde_json::json!({"outputType": "float", "result": 2.5});
        assert_eq!(
            to_json(&value, true).unwrap(),
            r#"{"outputType":"float","result":2.5}"#
        );
        assert!(to_json(&value, false).unwrap().contains('\n'));
    }

    #[test]
    fn test_write_output_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("out.json");

        write_output("{}", path.to_str()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}

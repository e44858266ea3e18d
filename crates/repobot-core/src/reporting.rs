//! Output files written by the bots.

use serde::Serialize;
use std::path::Path;

use crate::domain::{AggregatedDocument, Result};
use crate::obs::emit_document_written;

/// Serialize as pretty JSON (two-space indentation) without a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write `value` to `path` as pretty JSON.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = to_pretty_json(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the aggregated imager document.
pub fn write_document(path: &Path, document: &AggregatedDocument) -> Result<()> {
    write_pretty_json(path, document)?;
    emit_document_written(&path.display().to_string(), document.os_list.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactDescriptor;
    use serde_json::json;

    #[test]
    fn test_pretty_json_uses_two_spaces() {
        let rendered = to_pretty_json(&json!({ "os_list": [{ "name": "a" }] })).unwrap();
        assert_eq!(
            rendered,
            "{\n  \"os_list\": [\n    {\n      \"name\": \"a\"\n    }\n  ]\n}"
        );
    }

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpi-imager.json");
        let document = AggregatedDocument {
            os_list: vec![ArtifactDescriptor::from_value("u", json!({ "name": "a" })).unwrap()],
        };

        write_document(&path, &document).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "os_list": [{ "name": "a" }] }));
    }
}

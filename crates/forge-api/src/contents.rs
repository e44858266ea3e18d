//! Repository file retrieval (policy files live in the repository itself).

use async_trait::async_trait;
use base64::Engine;

use crate::catalog::RepoRef;
use crate::error::FeedError;
use crate::Result;

/// Reads files from a hosted repository's default branch.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Text of the file at `path`.
    async fn fetch_file(&self, repo: &RepoRef, path: &str) -> Result<String>;
}

/// Decode a contents API payload into text.
///
/// The API wraps base64 output at 60 columns; whitespace is stripped before
/// decoding.
pub fn decode_content(content: &str, encoding: &str) -> Result<String> {
    let bytes = match encoding {
        "base64" => {
            let compact: String = content.split_whitespace().collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| FeedError::Decode(format!("invalid base64 content: {}", e)))?
        }
        "utf-8" | "utf8" | "" => content.as_bytes().to_vec(),
        other => {
            return Err(FeedError::Decode(format!(
                "unsupported content encoding: {}",
                other
            )))
        }
    };
    String::from_utf8(bytes).map_err(|e| FeedError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_wrapped_base64() {
        // "problem_label: invalid\n" split across lines like the API does
        let content = "cHJvYmxlbV9sYWJlbDog\naW52YWxpZAo=\n";
        assert_eq!(
            decode_content(content, "base64").unwrap(),
            "problem_label: invalid\n"
        );
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let err = decode_content("", "none").unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_content("!!!", "base64").is_err());
    }
}

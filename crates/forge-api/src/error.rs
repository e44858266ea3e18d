//! Error types for forge-api

use thiserror::Error;

/// Errors that can occur while talking to the forge
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// GraphQL endpoint returned errors
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    /// Repository missing from the GraphQL response
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// `owner/name` could not be parsed
    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),

    /// Catalog violates the newest-first ordering
    #[error("Release catalog out of order: {newer} was created before {older}")]
    OutOfOrder { newer: String, older: String },

    /// Lookup in a fake or remote store found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be decoded (base64, gzip or UTF-8)
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FeedError::Status {
            url: "https://example.com/asset.json".to_string(),
            status: 404,
        };
        let msg = err.to_string();
        assert!(msg.contains("asset.json"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_out_of_order_display() {
        let err = FeedError::OutOfOrder {
            newer: "v2".to_string(),
            older: "v1".to_string(),
        };
        assert!(err.to_string().contains("out of order"));
    }
}

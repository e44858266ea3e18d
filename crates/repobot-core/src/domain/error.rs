//! Domain-level error taxonomy for repobot.

use forge_api::FeedError;

/// repobot domain errors.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("forge error: {0}")]
    Feed(#[from] FeedError),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("descriptor at {url} is not a JSON object")]
    DescriptorNotObject { url: String },

    #[error("invalid policy config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repobot domain operations.
pub type Result<T> = std::result::Result<T, BotError>;

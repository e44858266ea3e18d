//! Domain models for repobot.
//!
//! - `ArtifactDescriptor` / `AggregatedDocument`: the imager descriptor output
//! - `BotError`: error taxonomy shared by every bot

pub mod descriptor;
pub mod error;

pub use descriptor::{AggregatedDocument, ArtifactDescriptor, INIT_FORMAT_FIELD};
pub use error::{BotError, Result};

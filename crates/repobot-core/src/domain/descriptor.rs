//! Descriptor documents published alongside releases.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{BotError, Result};

/// Field the imager reads to pick a customisation format.
pub const INIT_FORMAT_FIELD: &str = "init_format";

/// One entry of an aggregated `os_list`.
///
/// Opaque apart from `name`, `description` and `init_format`; every other
/// field passes through untouched and in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactDescriptor(Map<String, Value>);

impl ArtifactDescriptor {
    /// Wrap a downloaded asset. `url` is only used for error reporting.
    pub fn from_value(url: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(ArtifactDescriptor(map)),
            _ => Err(BotError::DescriptorNotObject {
                url: url.to_string(),
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Replace the display name, keeping the upstream name as the description.
    ///
    /// A descriptor without a `name` loses its `description` as well.
    pub fn rename(&mut self, name: &str) {
        match self.0.insert("name".to_string(), Value::String(name.to_string())) {
            Some(previous) => {
                self.0.insert("description".to_string(), previous);
            }
            None => {
                self.0.shift_remove("description");
            }
        }
    }

    pub fn set_init_format(&mut self, init_format: &str) {
        self.0.insert(
            INIT_FORMAT_FIELD.to_string(),
            Value::String(init_format.to_string()),
        );
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// The combined document written for the imager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDocument {
    /// Stable descriptor first, prerelease descriptor second if present
    pub os_list: Vec<ArtifactDescriptor>,
}

//! Typed access to tool call arguments.

use crate::error::MuseError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, MuseError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, MuseError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| MuseError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, MuseError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| MuseError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    ///
    /// Some models send arguments as a JSON-encoded string; those are decoded
    /// first, and an empty string is treated as `{}`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, MuseError> {
        let value = match &self.value {
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
                        MuseError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
                    })?
                }
            }
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| {
            MuseError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

use crate::split::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Configuration for the splitting process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Path of keys leading to the array to split, outermost first
    #[serde(alias = "path")]
    pub keys: Vec<String>,

    /// Field that receives each element in the derived records
    #[serde(alias = "target_field")]
    pub target: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            keys: vec![String::from("events")],
            target: String::from("message"),
        }
    }
}

impl SplitConfig {
    pub fn new<I, S>(keys: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SplitConfig {
            keys: keys.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Check the invariants a splitter relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::EmptyKeys);
        }

        if let Some(position) = self.keys.iter().position(|k| k.is_empty()) {
            return Err(ConfigError::EmptyKey { position });
        }

        Ok(())
    }

    /// Build a config from a JSON object such as `{"keys": ["body", "events"], "target": "event"}`.
    ///
    /// Missing options take their defaults. Unknown options, or an option set
    /// together with its alias, are rejected. Unlike plain deserialization,
    /// badly typed `keys` are reported with the offending value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(ConfigError::Parse(format!(
                    "expected a JSON object but got: {}",
                    other
                )))
            }
        };

        let mut config = SplitConfig::default();

        if let Some(keys) = take_option(&mut obj, "keys", "path")? {
            config.keys = Self::parse_keys(keys)?;
        }

        if let Some(target) = take_option(&mut obj, "target", "target_field")? {
            match target {
                Value::String(s) => config.target = s,
                other => return Err(ConfigError::InvalidTarget { found: other.to_string() }),
            }
        }

        if let Some(name) = obj.keys().next() {
            return Err(ConfigError::UnknownOption { name: name.clone() });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    fn parse_keys(value: Value) -> Result<Vec<String>, ConfigError> {
        let invalid = |v: &Value| ConfigError::InvalidKeys { found: v.to_string() };

        let Value::Array(items) = &value else {
            return Err(invalid(&value));
        };

        items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(&value)))
            .collect()
    }
}

/// Remove an option that may be spelled either way, but not both
fn take_option(
    obj: &mut Map<String, Value>,
    option: &'static str,
    alias: &'static str,
) -> Result<Option<Value>, ConfigError> {
    match (obj.remove(option), obj.remove(alias)) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingOptions { option, alias }),
        (value, None) | (None, value) => Ok(value),
    }
}

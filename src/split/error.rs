use thiserror::Error;

/// Raised when a splitter is built from an unusable configuration.
///
/// These never occur per record: a splitter that exists has a valid config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("\"keys\" must not be empty")]
    EmptyKeys,

    #[error("\"keys\" must not contain an empty string (at position {position})")]
    EmptyKey { position: usize },

    #[error("\"keys\" must be an Array of Strings but is: {found}")]
    InvalidKeys { found: String },

    #[error("\"target\" must be a String but is: {found}")]
    InvalidTarget { found: String },

    #[error("unknown option \"{name}\"")]
    UnknownOption { name: String },

    #[error("\"{option}\" and its alias \"{alias}\" are both set")]
    ConflictingOptions {
        option: &'static str,
        alias: &'static str,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Reasons a single record could not be split.
///
/// The record is still consumed; the host keeps going with the next one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// A value in the middle of the key path was not an object
    #[error("Input must be a JSON object but is instead: {type_name} (while looking up \"{key}\").")]
    TraversalType { type_name: &'static str, key: String },

    /// The value at the end of the key path was present but not an array
    #[error("Filtered input should be an Array but is instead: {type_name} ({repr}).")]
    ExpectedArray { type_name: &'static str, repr: String },
}

use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Boxed error returned by providers and user-defined decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to turn a raw string into a destination shape.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{source}")]
    Decode {
        type_name: &'static str,
        source: BoxError,
    },

    #[error("invalid boolean '{raw}'")]
    InvalidBool { raw: String },

    #[error("invalid {shape} '{raw}': {source}")]
    InvalidInt {
        raw: String,
        shape: &'static str,
        source: ParseIntError,
    },

    #[error("invalid {shape} '{raw}': {source}")]
    InvalidFloat {
        raw: String,
        shape: &'static str,
        source: ParseFloatError,
    },

    #[error("{shape} '{raw}' is out of range")]
    FloatOutOfRange { raw: String, shape: &'static str },

    #[error("invalid duration '{raw}': {source}")]
    InvalidDuration {
        raw: String,
        source: humantime::DurationError,
    },

    #[error("type {type_name} is not convertible from a string")]
    NotConvertible { type_name: &'static str },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("provider '{provider}' failed to retrieve '{key}': {source}")]
    Provider {
        provider: String,
        key: String,
        source: BoxError,
    },

    #[error("invalid value for '{key}': {source}")]
    Convert { key: String, source: ConvertError },

    #[error("missing required value for '{key}'")]
    Missing { key: String },

    #[error("key '{key}' conflicts with another configured key")]
    KeyConflict { key: String },

    #[error("value for '{key}' does not fit in a config {shape}")]
    Unrepresentable { key: String, shape: &'static str },

    #[error("{} configuration errors: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<ConfigError>),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// Flattens nested aggregates into the list of individual errors.
    pub fn into_errors(self) -> Vec<ConfigError> {
        match self {
            ConfigError::Multiple(errors) => errors
                .into_iter()
                .flat_map(ConfigError::into_errors)
                .collect(),
            other => vec![other],
        }
    }
}

use crate::config::{ConfigError, ConvertError};
use thiserror::Error;

/// Top-level error type for the confbind library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),
}

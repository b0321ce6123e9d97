//! Precedence-ordered lookup of keys across providers.

use std::any::Any;

use tracing::{debug, trace};

use super::args::ArgsProvider;
use super::convert::{convert, Shape, Value};
use super::dotenv::DotenvProvider;
use super::env::EnvProvider;
use super::error::ConfigError;
use super::source::Provider;

/// Flag naming an alternative dotenv file for the process defaults.
pub const DOTENV_FLAG: &str = "dotenv";

/// A raw value and the provider it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub value: String,
    pub source: &'a str,
}

/// A configuration field to resolve: its key, destination shape and default.
#[derive(Debug, Clone)]
pub struct Field {
    key: String,
    shape: Shape,
    default: Option<String>,
    required: bool,
}

impl Field {
    pub fn new(key: impl Into<String>, shape: Shape) -> Self {
        Self {
            key: key.into(),
            shape,
            default: None,
            required: true,
        }
    }

    /// A field converted with the built-in shape of `T`.
    pub fn of<T: Any>(key: impl Into<String>) -> Self {
        Self::new(key, Shape::of::<T>())
    }

    /// Raw value used when no provider has the key. It is converted like any
    /// provided value.
    pub fn with_default(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    /// A missing optional field without default is skipped instead of
    /// reported as [`ConfigError::Missing`].
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// A resolved and converted field.
#[derive(Debug)]
pub struct Binding {
    pub key: String,
    /// Text the value was converted from.
    pub raw: String,
    pub value: Value,
    /// Name of the provider that supplied the value, `None` for defaults.
    pub source: Option<String>,
    pub used_default: bool,
}

/// An ordered set of providers.
///
/// Providers are sorted by ascending priority once at construction; providers
/// with equal priority keep their registration order.
#[derive(Debug, Default)]
pub struct Resolver {
    providers: Vec<Box<dyn Provider>>,
}

impl Resolver {
    pub fn new(mut providers: Vec<Box<dyn Provider>>) -> Self {
        providers.sort_by_key(|provider| provider.priority());
        Self { providers }
    }

    /// Command-line arguments, process environment and a dotenv file.
    ///
    /// The dotenv file is `.env` unless a non-empty `--dotenv` flag names
    /// another one.
    pub fn from_process() -> Self {
        Self::new(process_providers())
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.iter().map(|provider| &**provider)
    }

    /// Returns the value from the first provider that has `key`.
    ///
    /// Later providers are not queried after a hit. A provider error aborts the
    /// lookup without falling back.
    pub fn resolve(&self, key: &str) -> Result<Option<Resolved<'_>>, ConfigError> {
        for provider in &self.providers {
            match provider.retrieve(key) {
                Ok(Some(value)) => {
                    debug!(key, provider = provider.name(), "resolved configuration key");
                    return Ok(Some(Resolved {
                        value,
                        source: provider.name(),
                    }));
                }
                Ok(None) => trace!(key, provider = provider.name(), "key not found"),
                Err(source) => {
                    return Err(ConfigError::Provider {
                        provider: provider.name().to_string(),
                        key: key.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(None)
    }

    /// Resolves and converts a single field.
    ///
    /// Returns `Ok(None)` only for an optional field with no value and no
    /// default.
    pub fn lookup(&self, field: &Field) -> Result<Option<Binding>, ConfigError> {
        let (raw, source) = match self.resolve(&field.key)? {
            Some(resolved) => (resolved.value, Some(resolved.source.to_string())),
            None => match &field.default {
                Some(default) => {
                    debug!(key = %field.key, "applying default value");
                    (default.clone(), None)
                }
                None if field.required => {
                    return Err(ConfigError::Missing {
                        key: field.key.clone(),
                    });
                }
                None => return Ok(None),
            },
        };

        let value = convert(&raw, &field.shape).map_err(|source| ConfigError::Convert {
            key: field.key.clone(),
            source,
        })?;

        Ok(Some(Binding {
            key: field.key.clone(),
            raw,
            value,
            used_default: source.is_none(),
            source,
        }))
    }
}

pub(crate) fn process_providers() -> Vec<Box<dyn Provider>> {
    let args = ArgsProvider::from_process();
    let dotenv = match args.get(DOTENV_FLAG) {
        Some(path) if !path.is_empty() => DotenvProvider::with_path(path),
        _ => DotenvProvider::new(),
    };

    vec![Box::new(args), Box::new(EnvProvider::new()), Box::new(dotenv)]
}

//! Typed configuration bound from command-line flags, the environment and
//! dotenv files.
//!
//! Values are looked up by logical key (`database.url`) across ranked
//! [`Provider`]s, the first hit wins, and the raw string is converted into the
//! requested [`Shape`].

pub mod config;
mod error;

pub use config::{
    convert, convert_to, format_env_key, ArgsProvider, Binding, Bindings, Config, ConfigError,
    ConvertError, DotenvProvider, EnvProvider, Field, FromBytes, Provider, Resolver, Shape, Value,
};
pub use error::Error;

//! Configuration resolution: providers, precedence and value conversion.

mod args;
mod builder;
mod convert;
mod dotenv;
mod env;
mod error;
mod key;
mod resolver;
mod source;

pub use args::{ArgsProvider, ARGS_PRIORITY};
pub use builder::{Bindings, Config};
pub use convert::{convert, convert_to, Decoder, FromBytes, Shape, Value};
pub use dotenv::{
    load_dotenv, parse_dotenv, unquote, DotenvProvider, DEFAULT_DOTENV_PATH, DOTENV_PRIORITY,
};
pub use env::{EnvProvider, ENV_PRIORITY};
pub use error::{BoxError, ConfigError, ConvertError};
pub use key::format_env_key;
pub use resolver::{Binding, Field, Resolved, Resolver, DOTENV_FLAG};
pub use source::Provider;

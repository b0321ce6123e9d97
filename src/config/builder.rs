use std::any::Any;
use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value as TomlValue};
use tracing::debug;

use super::args::ArgsProvider;
use super::convert::{Shape, Value};
use super::dotenv::DotenvProvider;
use super::env::EnvProvider;
use super::resolver::{process_providers, Binding, Field, Resolver};
use super::source::Provider;
use super::ConfigError;

/// Builder for binding configuration fields to provider values.
///
/// Every declared field is resolved independently across the registered
/// providers, converted into its [`Shape`] and collected. All field errors are
/// reported together rather than stopping at the first one.
///
/// ## Example
///
/// ```no_run
/// use confbind::{Config, Field};
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct Database {
///     url: String,
///     timeout: Duration,
/// }
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     database: Database,
///     port: u16,
/// }
///
/// // --database.url=... on the command line, DATABASE_URL in the
/// // environment or in .env
/// let config: MyConfig = Config::builder()
///     .with_process_defaults()
///     .with_field(Field::of::<String>("database.url"))
///     .with_field(Field::of::<Duration>("database.timeout").with_default("5s"))
///     .with_field(Field::of::<u16>("port").with_default("8080"))
///     .build()?;
/// # Ok::<(), confbind::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .bind() or .build() is called"]
pub struct Config {
    providers: Vec<Box<dyn Provider>>,
    fields: Vec<Field>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Registers a provider. Providers are consulted by ascending priority,
    /// then registration order.
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Adds an [`ArgsProvider`] over the given argument list.
    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_provider(ArgsProvider::new(args))
    }

    /// Adds an [`EnvProvider`] over the live process environment.
    pub fn with_env(self) -> Self {
        self.with_provider(EnvProvider::new())
    }

    /// Adds a [`DotenvProvider`] loaded from `path`. A missing file is not an error.
    pub fn with_dotenv(self, path: impl AsRef<Path>) -> Self {
        self.with_provider(DotenvProvider::with_path(path))
    }

    /// Adds process arguments, process environment and `.env` (or the file
    /// named by `--dotenv`).
    pub fn with_process_defaults(mut self) -> Self {
        self.providers.extend(process_providers());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for a required field without default.
    pub fn field(self, key: impl Into<String>, shape: Shape) -> Self {
        self.with_field(Field::new(key, shape))
    }

    /// Resolves and converts every declared field.
    pub fn bind(self) -> Result<Bindings, ConfigError> {
        let resolver = Resolver::new(self.providers);
        let mut entries = Vec::with_capacity(self.fields.len());
        let mut errors = Vec::new();

        for field in &self.fields {
            match resolver.lookup(field) {
                Ok(Some(binding)) => entries.push(binding),
                Ok(None) => debug!(key = field.key(), "optional field left unset"),
                Err(e) => errors.push(e),
            }
        }

        match errors.len() {
            0 => Ok(Bindings { entries }),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::Multiple(errors)),
        }
    }

    /// Binds every field and deserializes the result into `T`.
    ///
    /// Keys are split on `.` into nested tables, so `database.url` fills
    /// `database: { url }`. Segments are used verbatim; use `#[serde(rename)]`
    /// for hyphenated keys.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let table = self.bind()?.to_table()?;
        let value = TomlValue::Table(table);
        value.try_into().map_err(ConfigError::DeserializeError)
    }
}

/// The converted fields produced by [`Config::bind`].
#[derive(Debug, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.entries.iter().find(|binding| binding.key == key)
    }

    /// Returns the value for `key` if it was bound and holds a `T`.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key)?.value.downcast_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assembles the bindings into a nested TOML table.
    pub fn to_table(&self) -> Result<Table, ConfigError> {
        let mut table = Table::new();

        for binding in &self.entries {
            let value = to_toml(binding)?;
            let path: Vec<&str> = binding.key.split('.').collect();
            if !insert_at_path(&mut table, &path, value) {
                return Err(ConfigError::KeyConflict {
                    key: binding.key.clone(),
                });
            }
        }

        Ok(table)
    }
}

impl IntoIterator for Bindings {
    type Item = Binding;
    type IntoIter = std::vec::IntoIter<Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Inserts `value` at a dotted path, creating intermediate tables.
///
/// Returns `false` if the path is empty, already taken, or runs through a
/// non-table value.
fn insert_at_path(table: &mut Table, path: &[&str], value: TomlValue) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };

    if rest.is_empty() {
        if table.contains_key(*first) {
            return false;
        }
        table.insert(first.to_string(), value);
        return true;
    }

    if !table.contains_key(*first) {
        table.insert(first.to_string(), TomlValue::Table(Table::new()));
    }

    match table.get_mut(*first) {
        Some(TomlValue::Table(nested)) => insert_at_path(nested, rest, value),
        _ => false,
    }
}

fn to_toml(binding: &Binding) -> Result<TomlValue, ConfigError> {
    let integer = |n: Option<i64>| {
        n.map(TomlValue::Integer)
            .ok_or_else(|| ConfigError::Unrepresentable {
                key: binding.key.clone(),
                shape: "integer",
            })
    };

    let value = match &binding.value {
        Value::Pattern(_) | Value::Custom(_) => TomlValue::String(binding.raw.clone()),
        Value::Text(v) => TomlValue::String(v.clone()),
        Value::Bytes(v) => integer_array(v.iter().map(|b| i64::from(*b))),
        Value::TextList(v) => TomlValue::Array(v.iter().cloned().map(TomlValue::String).collect()),
        Value::I32List(v) => integer_array(v.iter().map(|n| i64::from(*n))),
        Value::I64List(v) => integer_array(v.iter().copied()),
        Value::Bool(v) => TomlValue::Boolean(*v),
        Value::I8(v) => TomlValue::Integer(i64::from(*v)),
        Value::I16(v) => TomlValue::Integer(i64::from(*v)),
        Value::I32(v) => TomlValue::Integer(i64::from(*v)),
        Value::I64(v) => TomlValue::Integer(*v),
        Value::I128(v) => integer(i64::try_from(*v).ok())?,
        Value::Isize(v) => integer(i64::try_from(*v).ok())?,
        Value::U8(v) => TomlValue::Integer(i64::from(*v)),
        Value::U16(v) => TomlValue::Integer(i64::from(*v)),
        Value::U32(v) => TomlValue::Integer(i64::from(*v)),
        Value::U64(v) => integer(i64::try_from(*v).ok())?,
        Value::U128(v) => integer(i64::try_from(*v).ok())?,
        Value::Usize(v) => integer(i64::try_from(*v).ok())?,
        Value::F32(v) => TomlValue::Float(f64::from(*v)),
        Value::F64(v) => TomlValue::Float(*v),
        Value::Duration(d) => {
            // serde's layout for std::time::Duration
            let mut table = Table::new();
            table.insert("secs".into(), integer(i64::try_from(d.as_secs()).ok())?);
            table.insert("nanos".into(), TomlValue::Integer(i64::from(d.subsec_nanos())));
            TomlValue::Table(table)
        }
    };

    Ok(value)
}

fn integer_array(values: impl Iterator<Item = i64>) -> TomlValue {
    TomlValue::Array(values.map(TomlValue::Integer).collect())
}

use std::fmt;
use std::sync::Arc;

use super::error::BoxError;
use super::key::format_env_key;
use super::source::Provider;

pub const ENV_PRIORITY: i32 = 2;

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A provider that reads environment variables on every lookup.
///
/// Keys are formatted with [`format_env_key`] first, so `database.url` is read
/// from `DATABASE_URL`. Nothing is cached: changes made to the environment
/// after construction are visible to later lookups.
#[derive(Clone)]
pub struct EnvProvider {
    lookup: Lookup,
}

impl EnvProvider {
    /// Reads from the live process environment.
    pub fn new() -> Self {
        Self::with_lookup(|name| {
            std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
        })
    }

    /// Reads through a custom accessor instead of the process environment.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    pub fn format_key(&self, key: &str) -> String {
        format_env_key(key)
    }
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvProvider").finish_non_exhaustive()
    }
}

impl Provider for EnvProvider {
    fn retrieve(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok((self.lookup)(&self.format_key(key)))
    }

    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> i32 {
        ENV_PRIORITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider_with(vars: &[(&str, &str)]) -> EnvProvider {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvProvider::with_lookup(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_lookup_uses_formatted_key() {
        let p = provider_with(&[("DATABASE_URL", "postgres://h/db"), ("API_KEY", "k")]);
        assert_eq!(
            p.retrieve("database.url").unwrap().as_deref(),
            Some("postgres://h/db")
        );
        assert_eq!(p.retrieve("api-key").unwrap().as_deref(), Some("k"));
        assert_eq!(p.retrieve("missing").unwrap(), None);
    }

    #[test]
    fn test_lowercase_variable_is_not_found() {
        let p = provider_with(&[("database_url", "x")]);
        assert_eq!(p.retrieve("database.url").unwrap(), None);
    }

    #[test]
    fn test_reads_live_environment() {
        let p = EnvProvider::new();
        assert_eq!(p.retrieve("confbind.live-test").unwrap(), None);

        temp_env::with_var("CONFBIND_LIVE_TEST", Some("after"), || {
            assert_eq!(
                p.retrieve("confbind.live-test").unwrap().as_deref(),
                Some("after")
            );
        });
    }

    #[test]
    fn test_name_and_priority() {
        let p = EnvProvider::new();
        assert_eq!(p.name(), "env");
        assert_eq!(p.priority(), 2);
        assert_eq!(p.format_key("a.b-c"), "A_B_C");
    }
}

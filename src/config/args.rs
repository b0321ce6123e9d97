use std::collections::HashMap;

use super::error::BoxError;
use super::source::Provider;

pub const ARGS_PRIORITY: i32 = 1;

/// A provider backed by `--key=value` style command-line flags.
///
/// The argument list is scanned once at construction. Accepted forms:
///
/// - `--key=value`
/// - `--key value`, when the next argument does not start with `--`
/// - `--key`, stored with an empty value so it differs from an absent flag
///
/// The last occurrence of a repeated flag wins.
#[derive(Debug, Clone, Default)]
pub struct ArgsProvider {
    args: HashMap<String, String>,
}

impl ArgsProvider {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut flags = HashMap::with_capacity(args.len());

        let mut i = 0;
        while i < args.len() {
            let Some(flag) = args[i].strip_prefix("--") else {
                i += 1;
                continue;
            };

            let (key, value) = match flag.split_once('=') {
                Some((key, value)) => (key, value.to_string()),
                None => match args.get(i + 1) {
                    Some(next) if !next.starts_with("--") => {
                        i += 1;
                        (flag, next.clone())
                    }
                    _ => (flag, String::new()),
                },
            };

            flags.insert(key.to_string(), value);
            i += 1;
        }

        Self { args: flags }
    }

    /// Scans the arguments of the running process.
    pub fn from_process() -> Self {
        Self::new(std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()))
    }

    /// Returns the parsed value of a flag without going through the trait.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

impl Provider for ArgsProvider {
    fn retrieve(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.args.get(key).cloned())
    }

    fn name(&self) -> &str {
        "args"
    }

    fn priority(&self) -> i32 {
        ARGS_PRIORITY
    }
}

//! Dotenv file source.
//!
//! The file format is line oriented:
//!
//! ```text
//! # comment
//! DATABASE_URL=postgres://localhost/app
//! API_KEY="secret \"quoted\" value"
//! RAW='no \n escapes here'
//! ```
//!
//! Keys are stored exactly as written. Lookups go through
//! [`format_env_key`], so a file must use the formatted names
//! (`DATABASE_URL`, not `database.url`) to be found from logical keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::error::BoxError;
use super::key::format_env_key;
use super::source::Provider;

pub const DOTENV_PRIORITY: i32 = 3;
pub const DEFAULT_DOTENV_PATH: &str = ".env";

/// A provider backed by a dotenv file, loaded once at construction.
///
/// A missing or unreadable file yields an empty provider rather than an error.
#[derive(Debug, Clone)]
pub struct DotenvProvider {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl DotenvProvider {
    /// Loads `.env` from the current working directory.
    pub fn new() -> Self {
        Self::with_path(DEFAULT_DOTENV_PATH)
    }

    /// Loads the given file. Relative paths are made absolute immediately, so
    /// later working directory changes have no effect.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let vars = load_dotenv(&path);
        Self { path, vars }
    }

    /// Absolute path the provider was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn format_key(&self, key: &str) -> String {
        format_env_key(key)
    }
}

impl Provider for DotenvProvider {
    fn retrieve(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.vars.get(&self.format_key(key)).cloned())
    }

    fn name(&self) -> &str {
        "dotenv"
    }

    fn priority(&self) -> i32 {
        DOTENV_PRIORITY
    }
}

impl Default for DotenvProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and parses a dotenv file.
///
/// Any failure to read the file results in an empty map. Invalid UTF-8 is
/// replaced per byte, so only the affected lines are damaged.
pub fn load_dotenv(path: &Path) -> HashMap<String, String> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let vars = parse_dotenv(&String::from_utf8_lossy(&bytes));
            debug!(path = %path.display(), entries = vars.len(), "loaded dotenv file");
            vars
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "dotenv file not loaded");
            HashMap::new()
        }
    }
}

/// Parses dotenv contents into raw keys and unquoted values.
///
/// Blank lines, `#` comments and lines without `=` are skipped.
pub fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            trace!(line = number + 1, "skipping dotenv line without '='");
            continue;
        };

        vars.insert(key.trim().to_string(), unquote(value.trim()));
    }

    vars
}

/// Strips surrounding quotes from a dotenv value.
///
/// Double-quoted values recognize `\"`, `\\`, `\n`, `\t` and `\r`. Any other
/// backslash is kept as is. Single-quoted values are taken verbatim.
pub fn unquote(value: &str) -> String {
    if value.len() < 2 {
        return value.to_string();
    }

    if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return unescape(inner);
    }

    if let Some(inner) = value
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return inner.to_string();
    }

    value.to_string()
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        let replacement = match chars.peek() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            _ => {
                result.push('\\');
                continue;
            }
        };
        chars.next();
        result.push(replacement);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const SAMPLE: &str = r#"# This is a comment
DATABASE_URL=postgres://localhost/test
API_KEY="secret-key"
DEBUG=true

# Another comment
PORT=8080
EMPTY_VALUE=
ANOTHER_VAR='quoted-value'
ESCAPED_QUOTES="value with \"escaped\" quotes"
REVERSE_NESTED='"bar"'
NOT_A_PAIR
  SPACED_KEY  =  spaced value
"#;

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_sample() {
        let vars = parse_dotenv(SAMPLE);
        assert_eq!(vars["DATABASE_URL"], "postgres://localhost/test");
        assert_eq!(vars["API_KEY"], "secret-key");
        assert_eq!(vars["DEBUG"], "true");
        assert_eq!(vars["PORT"], "8080");
        assert_eq!(vars["EMPTY_VALUE"], "");
        assert_eq!(vars["ANOTHER_VAR"], "quoted-value");
        assert_eq!(vars["ESCAPED_QUOTES"], r#"value with "escaped" quotes"#);
        assert_eq!(vars["REVERSE_NESTED"], r#""bar""#);
        assert_eq!(vars["SPACED_KEY"], "spaced value");
        assert!(!vars.contains_key("NOT_A_PAIR"));
        assert_eq!(vars.len(), 9);
    }

    #[test]
    fn test_crlf_line_endings() {
        let vars = parse_dotenv("A=1\r\nB=\"two\"\r\n");
        assert_eq!(vars["A"], "1");
        assert_eq!(vars["B"], "two");
    }

    #[test]
    fn test_value_keeps_later_equals() {
        let vars = parse_dotenv("URL=https://h/?a=b&c=d");
        assert_eq!(vars["URL"], "https://h/?a=b&c=d");
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a\nb\tc\rd""#), "a\nb\tc\rd");
        assert_eq!(unquote(r#""back\\slash""#), "back\\slash");
        assert_eq!(unquote(r#""\\n""#), "\\n");
        assert_eq!(unquote(r#""keep \x as is""#), "keep \\x as is");
        assert_eq!(unquote(r#""trailing\""#), "trailing\\");
    }

    #[test]
    fn test_unquote_single_quotes_are_verbatim() {
        assert_eq!(unquote(r"'a\nb'"), r"a\nb");
    }

    #[test]
    fn test_unquote_edge_cases() {
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("''"), "");
        assert_eq!(unquote("\"mismatched'"), "\"mismatched'");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn test_provider_lookup_by_logical_key() {
        let file = sample_file();
        let p = DotenvProvider::with_path(file.path());

        let cases = [
            ("database.url", Some("postgres://localhost/test")),
            ("api.key", Some("secret-key")),
            ("api-key", Some("secret-key")),
            ("debug", Some("true")),
            ("port", Some("8080")),
            ("empty.value", Some("")),
            ("nonexistent", None),
        ];
        for (key, expected) in cases {
            assert_eq!(p.retrieve(key).unwrap().as_deref(), expected, "key {key}");
        }
    }

    #[test]
    fn test_file_keys_are_not_formatted() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database.url=lower").unwrap();
        let p = DotenvProvider::with_path(file.path());

        assert_eq!(p.len(), 1);
        assert_eq!(p.retrieve("database.url").unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_keeps_valid_lines() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"# caf\xe9 comment\nPORT=8080\nNAME=ab\xffcd\n")
            .unwrap();
        let p = DotenvProvider::with_path(file.path());

        assert_eq!(p.retrieve("port").unwrap().as_deref(), Some("8080"));
        assert_eq!(
            p.retrieve("name").unwrap().as_deref(),
            Some("ab\u{FFFD}cd")
        );
    }

    #[test]
    fn test_default_reads_dot_env_in_working_directory() {
        let p = DotenvProvider::default();
        assert!(p.path().ends_with(DEFAULT_DOTENV_PATH));
        assert!(p.path().is_absolute());
    }

    #[test]
    fn test_nonexistent_file_is_empty() {
        let p = DotenvProvider::with_path("/nonexistent/path/.env");
        assert!(p.is_empty());
        assert_eq!(p.retrieve("any.key").unwrap(), None);
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("custom.env"), "CUSTOM_VAR=custom-value\n").unwrap();

        let p = DotenvProvider::with_path(dir.path().join("custom.env"));
        assert!(p.path().is_absolute());
        assert_eq!(
            p.retrieve("custom.var").unwrap().as_deref(),
            Some("custom-value")
        );

        let relative = DotenvProvider::with_path("does-not-exist.env");
        assert!(relative.path().is_absolute());
    }

    #[test]
    fn test_name_and_priority() {
        let p = DotenvProvider::with_path("/nonexistent/.env");
        assert_eq!(p.name(), "dotenv");
        assert_eq!(p.priority(), 3);
    }
}

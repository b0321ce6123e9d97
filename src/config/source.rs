use std::fmt;

use super::error::BoxError;

/// A ranked source of raw string values.
///
/// Providers only ever hand out strings; conversion into typed values happens
/// afterwards in [`convert`](super::convert::convert). `Ok(None)` is the only
/// "miss" signal. An `Err` means the provider failed for a reason other than
/// absence and aborts resolution of that key.
///
/// Implement this trait to plug in new sources (remote stores, secret files).
pub trait Provider: Send + Sync + fmt::Debug {
    /// Looks up the raw value for a logical key.
    fn retrieve(&self, key: &str) -> Result<Option<String>, BoxError>;

    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Precedence rank. Lower values are checked first.
    fn priority(&self) -> i32;
}

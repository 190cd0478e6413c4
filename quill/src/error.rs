use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors from constructing rules. Everything at edit time degrades to a
/// [`Diagnostic`](crate::Diagnostic) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

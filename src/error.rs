use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a rebuild. The flattened `Display` text is the
/// diagnostic handed back to the caller; no render is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No JavaScript/TypeScript files found")]
    NoScriptFiles,
    #[error("Invalid option `{field}`: {value:?} is not a valid identifier")]
    InvalidOption { field: &'static str, value: String },
}

/// Failures of the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project `{0}` not found")]
    NotFound(String),
    #[error("invalid project id `{0}`")]
    InvalidId(String),
    #[error("i/o error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project `{id}`: {source}")]
    Format {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

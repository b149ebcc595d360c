//! Crate-wide error taxonomy.
//!
//! Mirrors the five recoverable/fatal error families the pipeline
//! distinguishes between: parse-time failures are per-file and recoverable,
//! schema failures are global and fatal, write failures are per-batch and
//! retried, link failures are per-pass, and query failures are user-initiated
//! and never abort indexing.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodeGraphError>;

#[derive(Debug, Error)]
pub enum CodeGraphError {
    /// A single file failed to parse. Recoverable: the walker records a
    /// diagnostic and moves on to the next file.
    #[error("parse error in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A tree-sitter subprocess/grammar call failed outright (timeout, panic
    /// across the FFI boundary, missing grammar). Recoverable per-file.
    #[error("subprocess error in {path}: {message}")]
    SubprocessError { path: PathBuf, message: String },

    /// The store's schema could not be established or is incompatible with
    /// the running binary. Fatal: indexing cannot proceed.
    #[error("schema error: {0}")]
    SchemaError(String),

    /// A batch write to the store gateway failed. Recoverable; callers
    /// retry with backoff before surfacing this.
    #[error("write error: {0}")]
    WriteError(String),

    /// One of the cross-language linker passes failed. Recoverable; other
    /// passes still run.
    #[error("link error in pass {pass}: {message}")]
    LinkError { pass: String, message: String },

    /// A user-initiated query (CSV export, graph read) failed. Never
    /// triggers a rollback of prior writes.
    #[error("query error: {0}")]
    QueryError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl CodeGraphError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn subprocess(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SubprocessError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn link(pass: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkError {
            pass: pass.into(),
            message: message.into(),
        }
    }

    /// Whether this error represents a recoverable, per-unit-of-work failure
    /// (as opposed to a fatal schema error that should abort the run).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CodeGraphError::SchemaError(_))
    }
}

//! Error types and exit codes for Remy.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const QUERY_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const UNKNOWN_FIELD: i32 = 4;
}

/// Main error type for Remy operations.
#[derive(Error, Debug)]
pub enum RemyError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Failed to parse query '{input}': {message}")]
    Parse { input: String, message: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operands for {0}")]
    InvalidOperands(String),

    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),

    #[error("Invalid time unit: {0}")]
    InvalidUnit(String),

    #[error("Not a predicate: {0}")]
    NotAPredicate(String),

    #[error("Date arithmetic out of range: {0}")]
    TemporalOverflow(String),

    #[error("Field '{0}' not found in configuration")]
    UnknownField(String),

    #[error("Duplicate label '{label}' in {path}:{line}")]
    DuplicateLabel {
        label: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedUrl(String),

    #[error("Cache not found at: {0}")]
    CacheNotFound(PathBuf),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl RemyError {
    /// Build a parse error for the given query text.
    pub fn parse(input: &str, message: impl Into<String>) -> Self {
        RemyError::Parse {
            input: input.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error comes from parsing or evaluating a query.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            RemyError::EmptyQuery
                | RemyError::Parse { .. }
                | RemyError::UnsupportedOperator(_)
                | RemyError::InvalidOperands(_)
                | RemyError::InvalidComparison(_)
                | RemyError::InvalidUnit(_)
                | RemyError::NotAPredicate(_)
                | RemyError::TemporalOverflow(_)
        )
    }

    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            e if e.is_query_error() => exit_code::QUERY_ERROR,
            RemyError::UnknownField(_) => exit_code::UNKNOWN_FIELD,
            RemyError::ConfigError(_)
            | RemyError::TomlParse(_)
            | RemyError::UnsupportedUrl(_)
            | RemyError::CacheNotFound(_) => exit_code::CONFIG_ERROR,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

/// Result type alias for Remy operations.
pub type Result<T> = std::result::Result<T, RemyError>;

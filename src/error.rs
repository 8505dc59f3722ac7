//! Error types for Routescribe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Routescribe operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors that can occur while scanning, configuring or reporting.
///
/// Nothing in the route pipeline itself returns these for recoverable
/// conditions; a file that cannot be parsed is skipped and reported.
#[derive(Error, Debug)]
pub enum RouteError {
    /// File system I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory or file not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The file is not a Go source file
    #[error("Unsupported file: {0}")]
    UnsupportedFile(PathBuf),

    /// The Go grammar could not be loaded into the parser
    #[error("Failed to initialize parser: {0}")]
    ParserInit(String),

    /// tree-sitter produced no tree for the file
    #[error("Failed to parse: {0}")]
    ParseFailed(PathBuf),

    /// Invalid configuration file or value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unknown duplicate-resolution strategy name
    #[error("Unknown duplicate strategy '{0}' (expected keep_first, replace_new or merge)")]
    InvalidStrategy(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request to a live server failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// No server answered at the given address
    #[error("No server reachable at {0}")]
    ServerUnavailable(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(e: reqwest::Error) -> Self {
        RouteError::Http(e.to_string())
    }
}

impl From<toml::de::Error> for RouteError {
    fn from(e: toml::de::Error) -> Self {
        RouteError::Config(e.to_string())
    }
}

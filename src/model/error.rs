//! Error types for gridscale.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error returned by the CLI entry point
//!   - [`InputError`] - Score snapshot reading failures (file not found, IO, JSON)
//!   - [`crate::config::ConfigError`] - Configuration loading failures
//!   - [`crate::logging::LoggingError`] - Tracing subscriber setup failures
//!
//! # Error Recovery Strategy
//!
//! The layout engine itself never returns errors: numeric edge cases (zero cell
//! sizes, unmeasurable containers, unresolvable anchors) degrade to cosmetic
//! defaults. Only the I/O boundary (config file, score file, log file) is fallible.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
///
/// All domain-specific error types convert to `AppError` via `From`, so `main`
/// can propagate with `?`.
///
/// # Examples
///
/// ```
/// use gridscale::model::error::{AppError, InputError};
/// use std::path::PathBuf;
///
/// let err: AppError = InputError::FileNotFound { path: PathBuf::from("/tmp/none.json") }.into();
/// assert!(err.to_string().contains("/tmp/none.json"));
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the score snapshot.
    #[error("Failed to read input: {0}")]
    Input(#[from] InputError),

    /// Failed to load or validate configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Failed to initialise logging.
    #[error("Failed to initialise logging: {0}")]
    Logging(#[from] crate::logging::LoggingError),
}

/// Errors from reading a score snapshot from a file or stdin.
#[derive(Debug, Error)]
pub enum InputError {
    /// The score file does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use gridscale::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.json")
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.json"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Stdin is a terminal and no file was given.
    #[error("No input: pass a score file or pipe JSON on stdin")]
    NoInput,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input was not a valid score snapshot.
    #[error("Invalid score JSON at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the error.
        line: usize,
        /// 1-based column of the error.
        column: usize,
        /// Parser message.
        message: String,
    },
}

impl From<serde_json::Error> for InputError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_keeps_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let input: InputError = err.into();
        match input {
            InputError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn io_error_converts_to_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app: AppError = InputError::from(io).into();
        assert!(matches!(app, AppError::Input(InputError::Io(_))));
        assert!(app.to_string().contains("denied"));
    }

    #[test]
    fn no_input_message_mentions_stdin() {
        assert!(InputError::NoInput.to_string().contains("stdin"));
    }
}

//! Tracing subscriber initialization.
//!
//! The engine runs inside a render loop, so logs go to a file rather than
//! stdout. Monitor them with `tail -f` in a separate terminal.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Log path has no parent directory
    #[error("Log path has no parent directory: {0:?}")]
    NoParentDirectory(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Initialize the tracing subscriber with file-based logging.
///
/// Respects RUST_LOG, defaults to "info". Creates the log directory if it
/// doesn't exist.
///
/// # Errors
///
/// Returns `LoggingError` if the subscriber was already initialized or the
/// directory could not be created.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    use tracing_subscriber::EnvFilter;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = log_path
        .parent()
        .ok_or_else(|| LoggingError::NoParentDirectory(log_path.to_path_buf()))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial(tracing_init)]
    fn init_creates_log_directory_if_missing() {
        let test_dir = std::env::temp_dir().join("gridscale_test_logs_create");
        let log_file = test_dir.join("test.log");

        let _ = fs::remove_dir_all(&test_dir);

        // May fail if the subscriber is already set; the directory is created first.
        let _ = init(&log_file);

        assert!(
            test_dir.exists(),
            "Log directory should be created: {:?}",
            test_dir
        );

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    #[serial(tracing_init)]
    fn init_succeeds_when_directory_already_exists() {
        let test_dir = std::env::temp_dir().join("gridscale_test_logs_exists");
        let log_file = test_dir.join("test.log");

        let _ = fs::create_dir_all(&test_dir);
        let _ = init(&log_file);

        assert!(test_dir.exists());

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_reports_subscriber_already_set() {
        let test_dir = std::env::temp_dir().join("gridscale_test_logs_twice");
        let log_file = test_dir.join("twice.log");

        let _ = init(&log_file);
        let second = init(&log_file);

        assert!(matches!(second, Err(LoggingError::SubscriberAlreadySet)));

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn root_path_without_file_name_is_invalid() {
        let result = init(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::InvalidPath(_))));
    }
}

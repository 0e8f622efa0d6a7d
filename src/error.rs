//! Error types shared by every tidydir operation.
//!
//! Fatal errors (bad directory, missing configuration, missing or corrupt log)
//! abort an operation before anything on disk changes. Per-file errors
//! (`MoveFailed`, `DeleteFailed`) are collected into reports and never stop
//! a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the organize, undo and duplicate engines.
#[derive(Debug, Error)]
pub enum TidyError {
    /// The target path does not exist or is not a directory.
    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    /// The category configuration file could not be found.
    #[error("Configuration not found: {}", .path.display())]
    ConfigurationMissing { path: PathBuf },

    /// A configuration file exists but could not be parsed or compiled.
    #[error("Invalid configuration {}: {reason}", .path.display())]
    ConfigurationInvalid { path: PathBuf, reason: String },

    /// Neither `undo_log.json` nor `date_sort_log.json` exists.
    #[error("No organization log found in {}", .dir.display())]
    NoLogFound { dir: PathBuf },

    /// A move log exists but cannot be read or parsed.
    #[error("Corrupt log {}: {reason}", .path.display())]
    CorruptLog { path: PathBuf, reason: String },

    /// A single file could not be moved.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be deleted.
    #[error("Failed to delete {}: {source}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reversal could not be completed.
    #[error("Reversal failed for {}: {reason}", .log.display())]
    ReversalFailed { log: PathBuf, reason: String },

    /// A move or deletion log could not be written.
    #[error("Failed to write log {}: {source}", .path.display())]
    LogWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless discriminant of [`TidyError`], for callers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DirectoryNotFound,
    ConfigurationMissing,
    ConfigurationInvalid,
    NoLogFound,
    CorruptLog,
    MoveFailed,
    DeleteFailed,
    ReversalFailed,
    LogWriteFailed,
}

impl TidyError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            Self::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            Self::ConfigurationInvalid { .. } => ErrorKind::ConfigurationInvalid,
            Self::NoLogFound { .. } => ErrorKind::NoLogFound,
            Self::CorruptLog { .. } => ErrorKind::CorruptLog,
            Self::MoveFailed { .. } => ErrorKind::MoveFailed,
            Self::DeleteFailed { .. } => ErrorKind::DeleteFailed,
            Self::ReversalFailed { .. } => ErrorKind::ReversalFailed,
            Self::LogWriteFailed { .. } => ErrorKind::LogWriteFailed,
        }
    }

    /// True for errors that concern a single file inside a batch.
    pub fn is_per_file(&self) -> bool {
        matches!(self.kind(), ErrorKind::MoveFailed | ErrorKind::DeleteFailed)
    }
}

/// Result type for tidydir operations.
pub type TidyResult<T> = Result<T, TidyError>;

/// Fails with `DirectoryNotFound` unless `path` is an existing directory.
pub(crate) fn ensure_directory(path: &std::path::Path) -> TidyResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(TidyError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_kind_matches_variant() {
        let err = TidyError::NoLogFound {
            dir: PathBuf::from("/tmp/x"),
        };
        assert_eq!(err.kind(), ErrorKind::NoLogFound);
        assert!(!err.is_per_file());

        let err = TidyError::DeleteFailed {
            path: PathBuf::from("a"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_per_file());
    }

    #[test]
    fn test_display_includes_path() {
        let err = TidyError::DirectoryNotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert_eq!(err.to_string(), "Directory not found: /no/such/dir");
    }

    #[test]
    fn test_ensure_directory_rejects_files() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, "x").expect("Failed to write file");

        assert!(ensure_directory(temp_dir.path()).is_ok());
        assert!(ensure_directory(&file).is_err());
        assert!(ensure_directory(Path::new("/non/existent/path")).is_err());
    }
}

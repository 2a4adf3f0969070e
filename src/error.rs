//! Error types for the tarball library
//!
//! Every failure the archiver can hit is surfaced as a [`TarballError`]. The three
//! variants callers usually care about map directly onto what went wrong on disk:
//! [`TarballError::PathNotFound`], [`TarballError::PermissionDenied`] and
//! [`TarballError::IoFailure`]. Raw `std::io::Error`s are classified into one of those
//! with [`TarballError::from_io`] so the failing path travels with the error.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Type alias for Results in the tarball library
pub type Result<T> = std::result::Result<T, TarballError>;

/// Main error type for all archive operations
#[derive(Debug, Error)]
pub enum TarballError {
    /// Root directory (or an entry that vanished mid-walk) does not exist
    #[error("Path not found: {0:?}")]
    PathNotFound(PathBuf),

    /// Root path exists but is not a directory
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    /// Source unreadable or destination unwritable
    #[error("Permission denied: {path:?}")]
    PermissionDenied {
        /// Path where permission was denied
        path: PathBuf,
    },

    /// Any other failure reported by the OS while touching `path`
    #[error("IO failure on {path:?}: {source}")]
    IoFailure {
        /// Path being read or written
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Walked path cannot be expressed as a tar member name
    #[error("Invalid entry name: {0:?}")]
    InvalidEntryName(PathBuf),

    /// I/O errors without a known path
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Errors during JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Archive read back does not match the source tree
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TarballError {
    /// Classify an I/O error that happened while working on `path`
    pub fn from_io(err: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => TarballError::PathNotFound(path),
            io::ErrorKind::PermissionDenied => TarballError::PermissionDenied { path },
            _ => TarballError::IoFailure { path, source: err },
        }
    }

    /// Classify a traversal error, keeping the path walkdir was visiting
    pub fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf);
        match path {
            // Loop errors carry no io::Error and stay as WalkDir
            Some(path) if err.io_error().is_some() => match err.into_io_error() {
                Some(io_err) => TarballError::from_io(io_err, path),
                None => TarballError::Internal(format!("lost walk error for {:?}", path)),
            },
            _ => TarballError::WalkDir(err),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        TarballError::Internal(msg.into())
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            TarballError::PathNotFound(path)
            | TarballError::NotADirectory(path)
            | TarballError::InvalidEntryName(path) => Some(path),
            TarballError::PermissionDenied { path } | TarballError::IoFailure { path, .. } => {
                Some(path)
            }
            TarballError::WalkDir(err) => err.path(),
            _ => None,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            TarballError::PathNotFound(path) => {
                format!("{:?} does not exist. Pass an existing directory to archive.", path)
            }
            TarballError::NotADirectory(path) => {
                format!("{:?} is not a directory. Only directory trees can be archived.", path)
            }
            TarballError::PermissionDenied { path } => {
                format!(
                    "Permission denied for {:?}. Check file permissions or run with appropriate privileges.",
                    path
                )
            }
            TarballError::IoFailure { path, source } => {
                format!("I/O failure on {:?}: {}. Check free space on the output device.", path, source)
            }
            _ => self.to_string(),
        }
    }
}

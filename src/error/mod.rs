//! # Error Module
//!
//! Error types for card verification.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file problems are not fatal** - they are collected and reported,
//!   only an unusable root directory or bad arguments stop a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read modification time of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The path the error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::DirectoryNotFound { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. }
            | ScanError::Metadata { path, .. } => path,
        }
    }
}

/// Errors that occur while fingerprinting a single file
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read EXIF data from {path}: {reason}")]
    Exif { path: PathBuf, reason: String },

    #[error("No identifying metadata in {path}")]
    NoMetadata { path: PathBuf },

    #[error("Fingerprinting was cancelled")]
    Cancelled,
}

impl FingerprintError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        FingerprintError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, VerifyError>;

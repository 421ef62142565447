//! Error types for the scanning, fetching and package-table layers.
//!
//! Each layer has its own error enum so callers can decide what is fatal.
//! A [`ScanError`] aborts one manifest file only; the directory scan records
//! it and moves on to the next file type.

use std::path::{Path, PathBuf};

/// Failure while scanning a single manifest or lockfile.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content does not match the schema expected for its format.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl ScanError {
    pub(crate) fn read(path: &Path, source: std::io::Error) -> Self {
        ScanError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, reason: impl ToString) -> Self {
        ScanError::Parse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Path of the file that failed.
    pub fn path(&self) -> &Path {
        match self {
            ScanError::Read { path, .. } | ScanError::Parse { path, .. } => path,
        }
    }
}

/// Failure while retrieving an action's repository.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("reference not found for version {version} of {action}")]
    RefNotFound { action: String, version: String },

    #[error("failed to check out {hash}: {stderr}")]
    Checkout { hash: String, stderr: String },

    #[error("failed to copy fixture {}: {reason}", path.display())]
    Fixture { path: PathBuf, reason: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while loading a vulnerable-package table.
#[derive(Debug, thiserror::Error)]
pub enum PackageListError {
    #[error("failed to read package list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid package list {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

//! Error types for tree construction and document loading

use std::path::PathBuf;

use crate::core::location::FileId;

/// Failures while querying locations or building a tree
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Location provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid replay file {}: {message}", .path.display())]
    Replay { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failures while loading a file's text.
///
/// `Clone` because a group memoizes its load outcome, failures included,
/// and hands the same value to every requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("Skipped {}: {reason}", .path.display())]
    Skipped { path: PathBuf, reason: String },

    #[error("Group {0} is no longer part of the tree")]
    Detached(String),

    #[error("Loader task for {0} did not complete")]
    Aborted(FileId),
}

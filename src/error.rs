//
//  error.rs
//  Blast
//
//  Created by hak (tharun)
//

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the impact engine and its collaborators.
///
/// Most analysis failures never reach the caller: unreadable files,
/// unresolved imports and collaborator outages are logged and degraded
/// locally. The variants here cover what does propagate.
#[derive(Debug, Error)]
pub enum BlastError {
    #[error("invalid project root: {0}")]
    InvalidProjectRoot(PathBuf),

    #[error("project root is not set")]
    ProjectRootNotSet,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("invalid ignore pattern: {0}")]
    Pattern(String),

    #[error("narrative generator failed: {0}")]
    Narrative(String),

    #[error("remote request failed: {0}")]
    Remote(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, BlastError>;

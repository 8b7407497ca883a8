// Error taxonomy for the library. The binary adds context with anyhow on top.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the core workflow. Each variant is one category the
/// operator can act on; transport errors are folded into the call that failed.
#[derive(Debug, Error)]
pub enum MemeError {
    #[error("used-set store '{}' failed: {}", .path.display(), .source)]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot list source directory '{}': {}", .path.display(), .source)]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("requested {requested} memes but only {available} are eligible")]
    InsufficientCandidates { requested: usize, available: usize },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("upload of '{item}' failed: {reason}")]
    Upload { item: String, reason: String },

    #[error("album creation failed: {0}")]
    AlbumCreation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type MemeResult<T> = Result<T, MemeError>;

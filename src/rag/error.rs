use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse operator-facing class of a [`RagError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable; fix the input.
    BadInput,
    /// A collaborator (embedder, generator) could not be reached; retry later.
    Unavailable,
    /// Persisted artifacts are missing, unreadable or disagree with each other.
    CorruptState,
}

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("shape mismatch: {what} (expected {expected}, got {actual})")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("failed to persist {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("corrupt index artifact {}: {message}", path.display())]
    CorruptIndex { path: PathBuf, message: String },

    #[error("index holds {index} vectors but docstore holds {docstore} entries")]
    Consistency { index: usize, docstore: usize },

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}

impl RagError {
    pub fn persistence<E: std::fmt::Display>(path: &Path, err: E) -> Self {
        RagError::Persistence {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn corrupt<E: std::fmt::Display>(path: &Path, err: E) -> Self {
        RagError::CorruptIndex {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        RagError::CollaboratorUnavailable(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::InvalidInput(_) => ErrorKind::BadInput,
            RagError::CollaboratorUnavailable(_) => ErrorKind::Unavailable,
            RagError::ShapeMismatch { .. }
            | RagError::Persistence { .. }
            | RagError::MissingFile(_)
            | RagError::CorruptIndex { .. }
            | RagError::Consistency { .. } => ErrorKind::CorruptState,
        }
    }
}

//! # Error Module
//!
//! Error types for the duplicate finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every error names the path it failed on
//! - **Fail fast** - walk and hash errors end an indexing run
//! - **No rollback** - a failed move leaves earlier moves in place

use crate::core::index::ImageHashKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DeduperError {
    #[error("Indexing error: {0}")]
    Index(#[from] IndexError),

    #[error("Finder error: {0}")]
    Find(#[from] FindError),

    #[error("Move error: {0}")]
    Move(#[from] MoveError),

    #[error("Directory {path} does not exist")]
    DirectoryNotFound { path: PathBuf },
}

/// Errors that occur while enumerating files
#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Error accessing path {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WalkError {
    /// The path the walk failed on
    pub fn path(&self) -> &Path {
        match self {
            WalkError::Access { path, .. } => path,
        }
    }
}

/// Errors that occur while hashing a single file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Error hashing file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

impl HashError {
    /// The file that could not be hashed
    pub fn path(&self) -> &Path {
        match self {
            HashError::Io { path, .. } | HashError::Decode { path, .. } => path,
        }
    }

    /// Decode failures mean "not an image", not a broken run
    pub fn is_decode(&self) -> bool {
        matches!(self, HashError::Decode { .. })
    }
}

/// Errors from building, saving or loading the index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("Error saving index file to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    #[error("Error loading index file {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("At least one hash strategy must be enabled (md5 or imagehash)")]
    NoStrategy,

    #[error("Failed to start hashing workers: {0}")]
    ThreadPool(String),
}

/// Invalid finder configuration, reported before any comparison runs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderConfigError {
    #[error("Finder type must be specified (md5 or imagehash)")]
    NoStrategy,

    #[error("Finder only supports 1 type of hash at a time (md5 or imagehash)")]
    MultipleStrategies,
}

/// Errors comparing two signatures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareError {
    #[error("Image hash kinds must be identical to compare ({left} vs {right})")]
    KindMismatch {
        left: ImageHashKind,
        right: ImageHashKind,
    },
}

/// Errors that occur while grouping duplicates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FindError {
    #[error(transparent)]
    Config(#[from] FinderConfigError),

    #[error("Comparing {path_a} with {path_b} failed: {source}")]
    Compare {
        path_a: PathBuf,
        path_b: PathBuf,
        #[source]
        source: CompareError,
    },
}

/// Errors that occur while relocating duplicates
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Error creating directory {path} for {source_path}: {source}")]
    CreateDir {
        path: PathBuf,
        source_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error moving {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not inside the index root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DeduperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_error_includes_path() {
        let error = HashError::Io {
            path: PathBuf::from("/photos/broken.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn decode_error_includes_path_and_reason() {
        let error = HashError::Decode {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        assert!(error.is_decode());
        assert_eq!(error.path(), Path::new("/photos/broken.jpg"));
        assert_eq!(
            error.to_string(),
            "Failed to decode image /photos/broken.jpg: invalid JPEG"
        );
    }

    #[test]
    fn move_error_names_source_and_destination() {
        let error = MoveError::Rename {
            from: PathBuf::from("/a/b.txt"),
            to: PathBuf::from("/out/a/b.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let message = error.to_string();
        assert!(message.contains("/a/b.txt"));
        assert!(message.contains("/out/a/b.txt"));
    }

    #[test]
    fn finder_config_errors_are_distinct() {
        assert_ne!(
            FinderConfigError::NoStrategy.to_string(),
            FinderConfigError::MultipleStrategies.to_string()
        );
    }

    #[test]
    fn index_error_wraps_hash_error_transparently() {
        let error: IndexError = HashError::Io {
            path: PathBuf::from("/x.txt"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        }
        .into();
        assert!(error.to_string().starts_with("Error hashing file /x.txt"));
    }
}

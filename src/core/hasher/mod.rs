//! # Hasher Module
//!
//! Computes the signatures stored in the index.
//!
//! ## Strategies
//! - **Content** ([`ContentHasher`]) - MD5 over the full file bytes
//! - **Perceptual** ([`ImageHasher`]) - 64-bit difference hash of the
//!   decoded image
//!
//! A file that cannot be opened or read is a [`HashError`]. A file that
//! is readable but is not a decodable image is *skipped* by the
//! perceptual strategy: no signature, no error.
//!
//! [`CompositeHasher`] runs every enabled strategy against one path and
//! folds their observations into a single [`FileRecord`].

mod content;
mod difference;
mod fast_decode;
mod fast_resize;
mod perceptual;

pub use content::ContentHasher;
pub use difference::difference_hash;
pub use perceptual::ImageHasher;

use crate::core::index::FileRecord;
use crate::core::strategy::{Strategy, StrategySet};
use crate::error::{HashError, IndexError};
use std::path::Path;

/// What a single strategy produced for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutcome {
    /// A partial record carrying this strategy's signature
    Hashed(FileRecord),
    /// The file is not something this strategy can fingerprint
    Skipped { reason: String },
}

/// Trait for signature strategies
pub trait FileHasher: Send + Sync {
    /// Fingerprint one file
    fn hash(&self, path: &Path) -> Result<HashOutcome, HashError>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Merged result of every enabled strategy for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    /// Signatures gathered for the file (possibly none)
    pub record: FileRecord,
    /// Reasons given by strategies that skipped the file
    pub skipped: Vec<String>,
}

/// Runs a fixed, non-empty set of strategies against each file
pub struct CompositeHasher {
    hashers: Vec<Box<dyn FileHasher>>,
}

impl CompositeHasher {
    /// Build the hashers for the enabled strategies
    pub fn new(strategies: StrategySet) -> Result<Self, IndexError> {
        let hashers = strategies
            .iter()
            .map(|strategy| -> Box<dyn FileHasher> {
                match strategy {
                    Strategy::Content => Box::new(ContentHasher::new()),
                    Strategy::Perceptual => Box::new(ImageHasher::new()),
                }
            })
            .collect();

        Self::from_hashers(hashers)
    }

    /// Use custom hashers (e.g., for testing)
    pub fn from_hashers(hashers: Vec<Box<dyn FileHasher>>) -> Result<Self, IndexError> {
        if hashers.is_empty() {
            return Err(IndexError::NoStrategy);
        }
        Ok(Self { hashers })
    }

    /// Run every strategy in turn and merge what they report.
    ///
    /// Returns once all strategies have finished or skipped; the first
    /// I/O failure ends the file.
    pub fn hash_file(&self, path: &Path) -> Result<HashedFile, HashError> {
        let mut record = FileRecord::new(path);
        let mut skipped = Vec::new();

        for hasher in &self.hashers {
            match hasher.hash(path)? {
                HashOutcome::Hashed(partial) => record.merge(partial),
                HashOutcome::Skipped { reason } => {
                    tracing::debug!(path = %path.display(), hasher = hasher.name(), %reason, "skipped");
                    skipped.push(reason);
                }
            }
        }

        Ok(HashedFile { record, skipped })
    }
}

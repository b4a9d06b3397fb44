//! Per-signature finder strategies.

use crate::core::index::{ContentDigest, FileRecord, ImageHash};
use crate::core::strategy::Strategy;
use crate::error::CompareError;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Extracts one kind of signature and decides when two are equal
pub trait FinderStrategy: Send + Sync {
    /// Signature compared between records
    type Key: Clone + Eq + Hash + Display + Debug;

    /// Which strategy this is
    fn strategy(&self) -> Strategy;

    /// The record's signature, if it has one for this strategy
    fn key(&self, record: &FileRecord) -> Option<Self::Key>;

    /// True when the two signatures identify duplicates
    fn same(&self, a: &Self::Key, b: &Self::Key) -> Result<bool, CompareError>;
}

/// Byte-exact MD5 equality
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFinder;

impl FinderStrategy for ContentFinder {
    type Key = ContentDigestKey;

    fn strategy(&self) -> Strategy {
        Strategy::Content
    }

    fn key(&self, record: &FileRecord) -> Option<Self::Key> {
        record.content_hash.map(ContentDigestKey)
    }

    fn same(&self, a: &Self::Key, b: &Self::Key) -> Result<bool, CompareError> {
        Ok(a.0.as_bytes() == b.0.as_bytes())
    }
}

/// Hex-displayed wrapper so cluster signatures read like `md5sum` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigestKey(pub ContentDigest);

impl Display for ContentDigestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// What to do when two image hashes of different kinds meet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindMismatchPolicy {
    /// Abort the search with [`CompareError::KindMismatch`]
    #[default]
    Error,
    /// Treat the pair as different images
    NeverEqual,
}

/// Zero Hamming distance between image hashes of the same kind
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFinder {
    policy: KindMismatchPolicy,
}

impl ImageFinder {
    pub fn new(policy: KindMismatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> KindMismatchPolicy {
        self.policy
    }
}

impl FinderStrategy for ImageFinder {
    type Key = ImageHash;

    fn strategy(&self) -> Strategy {
        Strategy::Perceptual
    }

    fn key(&self, record: &FileRecord) -> Option<Self::Key> {
        record.image_hash
    }

    fn same(&self, a: &Self::Key, b: &Self::Key) -> Result<bool, CompareError> {
        match a.distance(b) {
            Ok(distance) => Ok(distance == 0),
            Err(_) if self.policy == KindMismatchPolicy::NeverEqual => Ok(false),
            Err(e) => Err(e),
        }
    }
}

//! MD5 content hashing.

use super::{FileHasher, HashOutcome};
use crate::core::index::{ContentDigest, FileRecord};
use crate::error::HashError;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Streams a file through MD5
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Digest of everything `path` contains
    pub fn digest(path: &Path) -> Result<ContentDigest, HashError> {
        let io_error = |source: io::Error| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let mut reader = BufReader::new(file);
        let mut context = md5::Context::new();
        io::copy(&mut reader, &mut context).map_err(io_error)?;

        Ok(ContentDigest::new(context.compute().0))
    }
}

impl FileHasher for ContentHasher {
    fn hash(&self, path: &Path) -> Result<HashOutcome, HashError> {
        let digest = Self::digest(path)?;
        Ok(HashOutcome::Hashed(
            FileRecord::new(path).with_content_hash(digest),
        ))
    }

    fn name(&self) -> &'static str {
        "md5"
    }
}

//! Perceptual image hashing.
//!
//! The format is guessed from the first bytes of the file. Only files in
//! a recognised image format are read in full and decoded.

use super::difference::difference_hash_with;
use super::fast_decode::FastDecoder;
use super::fast_resize::FastResizer;
use super::{FileHasher, HashOutcome};
use crate::core::index::{FileRecord, ImageHash, ImageHashKind};
use crate::error::HashError;
use image::{ImageFormat, ImageReader};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;

thread_local! {
    static RESIZER: RefCell<FastResizer> = RefCell::new(FastResizer::new());
}

/// Fingerprints decodable images with a 64-bit dHash.
///
/// Files that are not images are skipped rather than reported as errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageHasher;

impl ImageHasher {
    pub fn new() -> Self {
        Self
    }

    /// Kind tag stored alongside every fingerprint this hasher produces
    pub fn kind(&self) -> ImageHashKind {
        ImageHashKind::Difference
    }

    /// Image format named by the file header, if any
    pub fn sniff_format(path: &Path) -> Result<Option<ImageFormat>, HashError> {
        let io_error = |source: io::Error| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .map_err(io_error)?
            .with_guessed_format()
            .map_err(io_error)?;
        Ok(reader.format())
    }

    fn fingerprint(&self, path: &Path) -> Result<u64, HashError> {
        let bytes = fs::read(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = FastDecoder::decode(&bytes, path)?;

        RESIZER
            .with(|resizer| difference_hash_with(&mut resizer.borrow_mut(), &image))
            .map_err(|e| match e {
                HashError::Decode { reason, .. } => HashError::Decode {
                    path: path.to_path_buf(),
                    reason,
                },
                other => other,
            })
    }
}

impl FileHasher for ImageHasher {
    fn hash(&self, path: &Path) -> Result<HashOutcome, HashError> {
        let Some(format) = Self::sniff_format(path)? else {
            return Ok(HashOutcome::Skipped {
                reason: "not a recognised image format".to_string(),
            });
        };
        tracing::trace!(path = %path.display(), ?format, "decoding image");

        match self.fingerprint(path) {
            Ok(value) => Ok(HashOutcome::Hashed(
                FileRecord::new(path).with_image_hash(ImageHash::new(self.kind(), value)),
            )),
            Err(e) if e.is_decode() => Ok(HashOutcome::Skipped {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "imagehash"
    }
}

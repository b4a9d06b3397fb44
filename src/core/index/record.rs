//! Per-file signature records.

use crate::error::CompareError;
use std::fmt;
use std::path::PathBuf;

/// MD5 digest of a file's full contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// Wrap raw digest bytes
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 16 bytes long
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 16]>::try_from(bytes).ok().map(Self)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hexadecimal form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Algorithm tag of an image fingerprint.
///
/// The numeric codes are the ones stored in the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageHashKind {
    Average,
    Perceptual,
    Difference,
    Wavelet,
}

impl ImageHashKind {
    /// Code written to the index file
    pub fn code(self) -> u8 {
        match self {
            ImageHashKind::Average => 1,
            ImageHashKind::Perceptual => 2,
            ImageHashKind::Difference => 3,
            ImageHashKind::Wavelet => 4,
        }
    }

    /// Parse an index file code; 0 and unknown codes yield `None`
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ImageHashKind::Average),
            2 => Some(ImageHashKind::Perceptual),
            3 => Some(ImageHashKind::Difference),
            4 => Some(ImageHashKind::Wavelet),
            _ => None,
        }
    }
}

impl fmt::Display for ImageHashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageHashKind::Average => write!(f, "aHash"),
            ImageHashKind::Perceptual => write!(f, "pHash"),
            ImageHashKind::Difference => write!(f, "dHash"),
            ImageHashKind::Wavelet => write!(f, "wHash"),
        }
    }
}

/// A 64-bit image fingerprint and the algorithm that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHash {
    pub kind: ImageHashKind,
    pub value: u64,
}

impl ImageHash {
    pub fn new(kind: ImageHashKind, value: u64) -> Self {
        Self { kind, value }
    }

    /// Hamming distance between two fingerprints.
    ///
    /// Only defined for fingerprints of the same kind.
    pub fn distance(&self, other: &ImageHash) -> Result<u32, CompareError> {
        if self.kind != other.kind {
            return Err(CompareError::KindMismatch {
                left: self.kind,
                right: other.kind,
            });
        }
        Ok((self.value ^ other.value).count_ones())
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.kind, self.value)
    }
}

/// Everything known about one indexed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Identity of the record; never changes once created
    pub path: PathBuf,
    /// Set once a content pass has run
    pub content_hash: Option<ContentDigest>,
    /// Set once a perceptual pass has produced a fingerprint
    pub image_hash: Option<ImageHash>,
}

impl FileRecord {
    /// A record with no signatures yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_hash: None,
            image_hash: None,
        }
    }

    pub fn with_content_hash(mut self, digest: ContentDigest) -> Self {
        self.content_hash = Some(digest);
        self
    }

    pub fn with_image_hash(mut self, hash: ImageHash) -> Self {
        self.image_hash = Some(hash);
        self
    }

    /// Take the signatures `other` carries; absent ones never erase.
    pub fn merge(&mut self, other: FileRecord) {
        if other.content_hash.is_some() {
            self.content_hash = other.content_hash;
        }
        if other.image_hash.is_some() {
            self.image_hash = other.image_hash;
        }
    }

    /// True when no signature has been recorded
    pub fn is_empty(&self) -> bool {
        self.content_hash.is_none() && self.image_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_when_present() {
        let mut record = FileRecord::new("hello").with_content_hash(ContentDigest::new([1; 16]));
        record.merge(FileRecord::new("hello").with_content_hash(ContentDigest::new([2; 16])));
        assert_eq!(record.content_hash, Some(ContentDigest::new([2; 16])));
    }

    #[test]
    fn merge_does_nothing_when_absent() {
        let mut record = FileRecord::new("hello").with_content_hash(ContentDigest::new([1; 16]));
        record.merge(FileRecord::new("hello"));
        assert_eq!(record.content_hash, Some(ContentDigest::new([1; 16])));
    }

    #[test]
    fn merge_keeps_image_hash_when_absent() {
        let hash = ImageHash::new(ImageHashKind::Difference, 0xc0a0_b0f0_f0f8_c0c0);
        let mut record = FileRecord::new("cat.jpg").with_image_hash(hash);
        record.merge(FileRecord::new("cat.jpg").with_content_hash(ContentDigest::new([9; 16])));
        assert_eq!(record.image_hash, Some(hash));
        assert!(record.content_hash.is_some());
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = ImageHash::new(ImageHashKind::Difference, 0b1111);
        let b = ImageHash::new(ImageHashKind::Difference, 0b0000);
        assert_eq!(a.distance(&b), Ok(4));
        assert_eq!(a.distance(&a), Ok(0));
    }

    #[test]
    fn distance_across_kinds_is_an_error() {
        let a = ImageHash::new(ImageHashKind::Difference, 1);
        let b = ImageHash::new(ImageHashKind::Average, 1);
        assert_eq!(
            a.distance(&b),
            Err(CompareError::KindMismatch {
                left: ImageHashKind::Difference,
                right: ImageHashKind::Average,
            })
        );
    }

    #[test]
    fn kind_codes_round_trip() {
        for kind in [
            ImageHashKind::Average,
            ImageHashKind::Perceptual,
            ImageHashKind::Difference,
            ImageHashKind::Wavelet,
        ] {
            assert_eq!(ImageHashKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ImageHashKind::from_code(0), None);
    }

    #[test]
    fn digest_from_slice_requires_sixteen_bytes() {
        assert!(ContentDigest::from_slice(&[0; 15]).is_none());
        assert!(ContentDigest::from_slice(&[0; 16]).is_some());
    }
}

//! JSON persistence for the index.
//!
//! The file is a JSON array with one object per record:
//!
//! ```json
//! [
//!   {
//!     "Path": "/photos/cat.jpg",
//!     "Md5Checksum": "lpylLlUdgJJmxoX3TVMRDQ==",
//!     "ImageHash": { "Kind": 3, "Hash": 13880826097364926656 }
//!   }
//! ]
//! ```
//!
//! A missing digest is `null`; a missing image hash is `{Kind: 0, Hash: 0}`.

use super::{ContentDigest, FileRecord, ImageHash, ImageHashKind, Index};
use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the index inside the index directory
pub const INDEX_FILE_NAME: &str = ".duplicate-index.json";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    #[serde(rename = "Path")]
    path: PathBuf,
    #[serde(rename = "Md5Checksum", with = "base64_bytes", default)]
    md5_checksum: Option<Vec<u8>>,
    #[serde(rename = "ImageHash", default)]
    image_hash: PersistedImageHash,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedImageHash {
    #[serde(rename = "Kind")]
    kind: u8,
    #[serde(rename = "Hash")]
    hash: u64,
}

impl From<&FileRecord> for PersistedRecord {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            md5_checksum: record.content_hash.map(|d| d.as_bytes().to_vec()),
            image_hash: record
                .image_hash
                .map(|h| PersistedImageHash {
                    kind: h.kind.code(),
                    hash: h.value,
                })
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<PersistedRecord> for FileRecord {
    type Error = String;

    fn try_from(persisted: PersistedRecord) -> Result<Self, Self::Error> {
        let content_hash = match persisted.md5_checksum {
            Some(bytes) => Some(ContentDigest::from_slice(&bytes).ok_or_else(|| {
                format!(
                    "checksum of {} is {} bytes, expected 16",
                    persisted.path.display(),
                    bytes.len()
                )
            })?),
            None => None,
        };

        let image_hash = match persisted.image_hash.kind {
            0 => None,
            code => {
                let kind = ImageHashKind::from_code(code).ok_or_else(|| {
                    format!(
                        "unknown image hash kind {} for {}",
                        code,
                        persisted.path.display()
                    )
                })?;
                Some(ImageHash::new(kind, persisted.image_hash.hash))
            }
        };

        Ok(FileRecord {
            path: persisted.path,
            content_hash,
            image_hash,
        })
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Reads and writes the index file inside an index directory
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Store for `<index_dir>/.duplicate-index.json`
    pub fn new(index_dir: &Path) -> Self {
        Self {
            path: index_dir.join(INDEX_FILE_NAME),
        }
    }

    /// Full path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist_error(&self, reason: impl ToString) -> IndexError {
        IndexError::Persist {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn load_error(&self, reason: impl ToString) -> IndexError {
        IndexError::Load {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Write every record of `index`, in index order.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so a failed save never leaves a truncated index behind.
    pub fn save(&self, index: &Index) -> Result<(), IndexError> {
        let persisted: Vec<PersistedRecord> =
            index.records().iter().map(PersistedRecord::from).collect();
        let json = serde_json::to_vec_pretty(&persisted).map_err(|e| self.persist_error(e))?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(|e| self.persist_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            self.persist_error(e)
        })?;

        tracing::debug!(path = %self.path.display(), records = persisted.len(), "index saved");
        Ok(())
    }

    /// Read all records from the index file
    pub fn load(&self) -> Result<Vec<FileRecord>, IndexError> {
        let bytes = fs::read(&self.path).map_err(|e| self.load_error(e))?;
        let persisted: Vec<PersistedRecord> =
            serde_json::from_slice(&bytes).map_err(|e| self.load_error(e))?;

        persisted
            .into_iter()
            .map(FileRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| self.load_error(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_index() -> Index {
        let index = Index::new();
        index.merge(FileRecord::new("/photos/a.txt").with_content_hash(ContentDigest::new([
            0x96, 0x9c, 0xa5, 0x2e, 0x55, 0x1d, 0x80, 0x92, 0x66, 0xc6, 0x85, 0xf7, 0x4d, 0x53,
            0x11, 0x0d,
        ])));
        index.merge(
            FileRecord::new("/photos/cat.jpg")
                .with_image_hash(ImageHash::new(ImageHashKind::Difference, 0xc0a0_b0f0_f0f8_c0c0)),
        );
        index
    }

    #[test]
    fn saved_file_uses_index_field_names() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        store.save(&sample_index()).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        let first = &json[0];
        assert_eq!(first["Path"], "/photos/a.txt");
        assert_eq!(first["Md5Checksum"], "lpylLlUdgJJmxoX3TVMRDQ==");
        assert_eq!(first["ImageHash"]["Kind"], 0);
        assert_eq!(first["ImageHash"]["Hash"], 0);

        let second = &json[1];
        assert!(second["Md5Checksum"].is_null());
        assert_eq!(second["ImageHash"]["Kind"], 3);
    }

    #[test]
    fn load_returns_records_in_saved_order() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        let index = sample_index();
        store.save(&index).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, index.records());
    }

    #[test]
    fn load_accepts_missing_optional_fields() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        fs::write(store.path(), r#"[{"Path": "/x.txt"}]"#).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![FileRecord::new("/x.txt")]);
    }

    #[test]
    fn load_missing_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());

        let err = store.load().unwrap_err();
        assert!(matches!(err, IndexError::Load { .. }));
    }

    #[test]
    fn load_garbage_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        fs::write(store.path(), "{ not an array").unwrap();

        assert!(matches!(store.load(), Err(IndexError::Load { .. })));
    }

    #[test]
    fn load_rejects_unknown_kind_code() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        fs::write(
            store.path(),
            r#"[{"Path": "/x.jpg", "Md5Checksum": null, "ImageHash": {"Kind": 42, "Hash": 1}}]"#,
        )
        .unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("unknown image hash kind 42"));
    }

    #[test]
    fn save_into_missing_directory_is_a_persist_error() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(&dir.path().join("missing"));

        assert!(matches!(
            store.save(&sample_index()),
            Err(IndexError::Persist { .. })
        ));
    }
}

//! # Index Module
//!
//! The registry of per-file signatures built by the indexer and read by
//! the finder.
//!
//! ## Layout
//! Records live in an insertion-ordered arena; a path→handle map gives
//! O(1) lookup when a new observation for an existing path is merged.
//! Both sit behind a single mutex and are never handed out separately.
//!
//! ## Persistence
//! See [`IndexStore`] for the on-disk JSON format.

mod record;
mod store;

pub use record::{ContentDigest, FileRecord, ImageHash, ImageHashKind};
pub use store::{IndexStore, INDEX_FILE_NAME};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct IndexInner {
    records: Vec<FileRecord>,
    handles: HashMap<PathBuf, usize>,
}

impl IndexInner {
    fn merge(&mut self, record: FileRecord) {
        match self.handles.get(&record.path) {
            Some(&handle) => self.records[handle].merge(record),
            None => {
                self.handles.insert(record.path.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

/// Thread-safe, insertion-ordered registry of [`FileRecord`]s
#[derive(Debug, Default)]
pub struct Index {
    inner: Mutex<IndexInner>,
}

impl Index {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records, merging any repeated paths
    pub fn from_records(records: Vec<FileRecord>) -> Self {
        let index = Self::new();
        index.replace(records);
        index
    }

    fn lock(&self) -> MutexGuard<'_, IndexInner> {
        // A panicking merge cannot leave the pair half-updated: the map
        // entry is only inserted together with its push.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Merge one observation into the index.
    ///
    /// A new path is appended; an existing path keeps its position and
    /// takes only the fields the observation actually carries.
    pub fn merge(&self, record: FileRecord) {
        self.lock().merge(record);
    }

    /// Replace the whole contents, rebuilding the path map from scratch
    pub fn replace(&self, records: Vec<FileRecord>) {
        let mut fresh = IndexInner::default();
        for record in records {
            fresh.merge(record);
        }
        *self.lock() = fresh;
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// True when the index holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the record for a path
    pub fn get(&self, path: &Path) -> Option<FileRecord> {
        let inner = self.lock();
        inner
            .handles
            .get(path)
            .map(|&handle| inner.records[handle].clone())
    }

    /// Snapshot of all records in index order
    pub fn records(&self) -> Vec<FileRecord> {
        self.lock().records.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn content(path: &str, digest: u8) -> FileRecord {
        FileRecord::new(path).with_content_hash(ContentDigest::new([digest; 16]))
    }

    #[test]
    fn merge_appends_new_paths_in_order() {
        let index = Index::new();
        index.merge(content("foo", 1));
        index.merge(content("bar", 2));

        let records = index.records();
        assert_eq!(records[0].path, PathBuf::from("foo"));
        assert_eq!(records[1].path, PathBuf::from("bar"));
        assert_eq!(records[1].content_hash, Some(ContentDigest::new([2; 16])));
    }

    #[test]
    fn merge_updates_existing_path_in_place() {
        let index = Index::new();
        index.merge(content("foo", 1));
        index.merge(content("bar", 2));
        index.merge(content("foo", 3));

        assert_eq!(index.len(), 2);
        let records = index.records();
        assert_eq!(records[0].path, PathBuf::from("foo"));
        assert_eq!(records[0].content_hash, Some(ContentDigest::new([3; 16])));
    }

    #[test]
    fn merge_without_content_hash_keeps_existing_one() {
        let index = Index::new();
        index.merge(content("foo", 1));
        index.merge(
            FileRecord::new("foo").with_image_hash(ImageHash::new(ImageHashKind::Difference, 7)),
        );

        let record = index.get(Path::new("foo")).unwrap();
        assert_eq!(record.content_hash, Some(ContentDigest::new([1; 16])));
        assert_eq!(
            record.image_hash,
            Some(ImageHash::new(ImageHashKind::Difference, 7))
        );
    }

    #[test]
    fn replace_rebuilds_lookup() {
        let index = Index::new();
        index.merge(content("old", 1));

        index.replace(vec![content("a", 1), content("b", 2), content("a", 3)]);

        assert_eq!(index.len(), 2);
        assert!(index.get(Path::new("old")).is_none());
        assert_eq!(
            index.get(Path::new("a")).unwrap().content_hash,
            Some(ContentDigest::new([3; 16]))
        );
    }

    #[test]
    fn concurrent_merges_keep_one_record_per_path() {
        let index = Arc::new(Index::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for i in 0..100 {
                        index.merge(content(&format!("file-{}", i), worker));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len(), 100);
        for (position, record) in index.records().iter().enumerate() {
            let found = index.get(&record.path).unwrap();
            assert_eq!(found.path, record.path, "handle {} out of sync", position);
        }
    }
}

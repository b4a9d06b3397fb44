//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the deduplicater engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Index building events
    Index(IndexEvent),
    /// Duplicate search events
    Find(FindEvent),
    /// Duplicate relocation events
    Move(MoveEvent),
}

/// Events while building an index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Indexing has started
    Started { root: PathBuf },
    /// Periodic progress update
    Progress(IndexProgress),
    /// A perceptual signature was not produced for a file
    FileSkipped { path: PathBuf, reason: String },
    /// Indexing finished and the index was saved
    Completed(IndexSummaryEvent),
    /// Indexing stopped on a fatal error; nothing was saved
    Failed { message: String },
}

/// Progress information while indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    /// Files hashed and merged so far
    pub indexed: usize,
    /// Files discovered by the walker so far
    pub discovered: usize,
    /// Time since indexing started
    pub elapsed_ms: u64,
}

/// Final numbers of a successful indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummaryEvent {
    /// Files discovered under the root
    pub files: usize,
    /// Records held by the index after merging
    pub records: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Events while grouping duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FindEvent {
    /// Search has started over this many records
    Started { records: usize },
    /// A new cluster was opened
    ClusterFound { signature: String, size: usize },
    /// Search completed
    Completed { clusters: usize, duplicates: usize },
}

/// Events while moving duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MoveEvent {
    /// A directory was created under the target
    DirectoryCreated { path: PathBuf },
    /// A duplicate was moved
    Moved { from: PathBuf, to: PathBuf },
    /// The keeper of a cluster, left in place
    Kept { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Index(IndexEvent::Progress(IndexProgress {
            indexed: 10,
            discovered: 50,
            elapsed_ms: 5000,
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Index(IndexEvent::Progress(p)) => {
                assert_eq!(p.indexed, 10);
                assert_eq!(p.discovered, 50);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn move_event_keeps_both_paths() {
        let event = Event::Move(MoveEvent::Moved {
            from: PathBuf::from("/b/b.txt"),
            to: PathBuf::from("/out/b/b.txt"),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("/b/b.txt"));
        assert!(json.contains("/out/b/b.txt"));
    }
}

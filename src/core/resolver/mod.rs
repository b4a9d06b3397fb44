//! # Resolver Module
//!
//! Moves duplicates out of the indexed tree.
//!
//! ## Keep Rule
//! Each cluster is sorted by path depth (number of separators), then by
//! the path with its extension stripped. The extension starts at the last
//! dot of the file name, so `.profile` has an empty stem. The first file stays where it
//! is; every other file is moved to the same relative location under the
//! target directory.
//!
//! Clusters are processed one at a time. The first failure stops the
//! run and everything moved before it stays moved.

use crate::core::finder::DuplicateCluster;
use crate::error::MoveError;
use crate::events::{null_sender, Event, EventSender, MoveEvent};
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Outcome of a completed move run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSummary {
    /// Files left in place, one per cluster
    pub kept: usize,
    /// Files moved under the target
    pub moved: usize,
    /// Directories created under the target
    pub directories_created: usize,
}

fn depth(path: &Path) -> usize {
    path.as_os_str()
        .as_encoded_bytes()
        .iter()
        .filter(|&&b| b == MAIN_SEPARATOR as u8)
        .count()
}

/// Path bytes up to the last dot of the final component
fn without_extension(path: &Path) -> &[u8] {
    let bytes = path.as_os_str().as_encoded_bytes();
    for (i, &b) in bytes.iter().enumerate().rev() {
        if b == MAIN_SEPARATOR as u8 {
            break;
        }
        if b == b'.' {
            return &bytes[..i];
        }
    }
    bytes
}

fn keep_cmp(a: &Path, b: &Path) -> Ordering {
    depth(a)
        .cmp(&depth(b))
        .then_with(|| without_extension(a).cmp(without_extension(b)))
}

/// Rename, falling back to copy and delete when the target is on
/// another filesystem
fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    fs::rename(source, dest).or_else(|e| {
        tracing::debug!(error = %e, from = %source.display(), "rename failed, copying");
        copy_and_remove(source, dest, |from, to| fs::copy(from, to))
    })
}

/// Copy with `copy`, check the size, then delete `source`.
/// A short copy is removed and `source` is left alone.
fn copy_and_remove<F>(source: &Path, dest: &Path, copy: F) -> io::Result<()>
where
    F: FnOnce(&Path, &Path) -> io::Result<u64>,
{
    let source_size = fs::metadata(source)?.len();
    copy(source, dest)?;

    let dest_size = fs::metadata(dest)?.len();
    if dest_size != source_size {
        let _ = fs::remove_file(dest);
        return Err(io::Error::other(format!(
            "copy verification failed: source {} bytes, dest {} bytes",
            source_size, dest_size
        )));
    }

    fs::remove_file(source)
}

/// Relocates all but one member of each duplicate cluster
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    /// `index_root` is the directory the clustered paths were indexed under
    pub fn new(index_root: impl AsRef<Path>) -> Self {
        let root = index_root.as_ref();
        Self {
            root: std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cluster members in keep order; the first one is the keeper
    pub fn keep_order(paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut sorted = paths.to_vec();
        sorted.sort_by(|a, b| keep_cmp(a, b));
        sorted
    }

    /// Where `path` ends up when moved under `target`
    pub fn destination(&self, path: &Path, target: &Path) -> Result<PathBuf, MoveError> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| MoveError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })?;
        Ok(target.join(relative))
    }

    pub fn move_duplicates(
        &self,
        clusters: &[DuplicateCluster],
        target: &Path,
    ) -> Result<MoveSummary, MoveError> {
        self.move_duplicates_with_events(clusters, target, &null_sender())
    }

    /// Move every non-keeper, stopping at the first failure
    pub fn move_duplicates_with_events(
        &self,
        clusters: &[DuplicateCluster],
        target: &Path,
        events: &EventSender,
    ) -> Result<MoveSummary, MoveError> {
        let mut summary = MoveSummary::default();

        for cluster in clusters {
            let ordered = Self::keep_order(&cluster.paths);
            let Some((keeper, duplicates)) = ordered.split_first() else {
                continue;
            };

            tracing::debug!(path = %keeper.display(), "keeping");
            events.send(Event::Move(MoveEvent::Kept {
                path: keeper.clone(),
            }));
            summary.kept += 1;

            for source in duplicates {
                let dest = self.destination(source, target)?;

                if let Some(parent) = dest.parent() {
                    if !parent.is_dir() {
                        tracing::info!(path = %parent.display(), "creating target directory");
                        fs::create_dir_all(parent).map_err(|e| MoveError::CreateDir {
                            path: parent.to_path_buf(),
                            source_path: source.clone(),
                            source: e,
                        })?;
                        summary.directories_created += 1;
                        events.send(Event::Move(MoveEvent::DirectoryCreated {
                            path: parent.to_path_buf(),
                        }));
                    }
                }

                tracing::info!(from = %source.display(), to = %dest.display(), "moving duplicate");
                move_file(source, &dest).map_err(|e| MoveError::Rename {
                    from: source.clone(),
                    to: dest.clone(),
                    source: e,
                })?;
                summary.moved += 1;
                events.send(Event::Move(MoveEvent::Moved {
                    from: source.clone(),
                    to: dest,
                }));
            }
        }

        Ok(summary)
    }
}

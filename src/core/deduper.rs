//! One-stop API over indexing, finding and moving.
//!
//! A [`Deduper`] owns one index. Creating or loading fills it, finding
//! reads it, and moving resolves paths relative to the index directory.

use crate::core::finder::{CompositeFinder, DuplicateCluster, KindMismatchPolicy};
use crate::core::index::Index;
use crate::core::indexer::{IndexSummary, Indexer, IndexerConfig};
use crate::core::resolver::{MoveSummary, Resolver};
use crate::core::strategy::StrategySet;
use crate::error::{DeduperError, FindError, Result};
use crate::events::{null_sender, EventSender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`Deduper`]
#[derive(Debug, Clone)]
pub struct DeduperBuilder {
    index_dir: PathBuf,
    strategies: StrategySet,
    config: IndexerConfig,
    kind_mismatch: KindMismatchPolicy,
}

impl DeduperBuilder {
    pub fn new() -> Self {
        Self {
            index_dir: PathBuf::from("."),
            strategies: StrategySet::new(),
            config: IndexerConfig::default(),
            kind_mismatch: KindMismatchPolicy::default(),
        }
    }

    /// Directory holding the index file; also the root for moves
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = dir.into();
        self
    }

    /// Indexing needs at least one strategy, finding exactly one
    pub fn strategies(mut self, strategies: StrategySet) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// How the finder treats image hashes of different kinds
    pub fn kind_mismatch(mut self, policy: KindMismatchPolicy) -> Self {
        self.kind_mismatch = policy;
        self
    }

    pub fn build(self) -> Result<Deduper> {
        let index = Arc::new(Index::new());
        let indexer = Indexer::builder()
            .index_dir(&self.index_dir)
            .strategies(self.strategies)
            .workers(self.config.workers)
            .progress_interval(self.config.progress_interval)
            .index(Arc::clone(&index))
            .build()?;

        Ok(Deduper {
            resolver: Resolver::new(&self.index_dir),
            index_dir: self.index_dir,
            strategies: self.strategies,
            kind_mismatch: self.kind_mismatch,
            index,
            indexer,
        })
    }
}

impl Default for DeduperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexer, finder and resolver sharing one index
pub struct Deduper {
    index_dir: PathBuf,
    strategies: StrategySet,
    kind_mismatch: KindMismatchPolicy,
    index: Arc<Index>,
    indexer: Indexer,
    resolver: Resolver,
}

impl Deduper {
    pub fn builder() -> DeduperBuilder {
        DeduperBuilder::new()
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    /// Location of the index file
    pub fn index_file(&self) -> &Path {
        self.indexer.index_file()
    }

    /// Index `dir` and save the result in the index directory
    pub fn create(&self, dir: &Path) -> Result<IndexSummary> {
        self.create_with_events(dir, &null_sender())
    }

    pub fn create_with_events(&self, dir: &Path, events: &EventSender) -> Result<IndexSummary> {
        Ok(self.indexer.create_with_events(dir, events)?)
    }

    /// Replace the in-memory index with the saved one
    pub fn load(&self) -> Result<usize> {
        Ok(self.indexer.load()?)
    }

    /// Duplicate clusters in the current index
    pub fn find(&self) -> Result<Vec<DuplicateCluster>> {
        self.find_with_events(&null_sender())
    }

    pub fn find_with_events(&self, events: &EventSender) -> Result<Vec<DuplicateCluster>> {
        let finder = CompositeFinder::with_policy(
            self.strategies,
            Arc::clone(&self.index),
            self.kind_mismatch,
        )
        .map_err(FindError::from)?;
        Ok(finder.find_with_events(events)?)
    }

    /// Succeeds only when `path` names an existing directory
    pub fn is_dir_exist(&self, path: &Path) -> Result<()> {
        is_dir_exist(path)
    }

    /// Move every non-keeper under `target`
    pub fn move_duplicates(&self, clusters: &[DuplicateCluster], target: &Path) -> Result<MoveSummary> {
        self.move_duplicates_with_events(clusters, target, &null_sender())
    }

    pub fn move_duplicates_with_events(
        &self,
        clusters: &[DuplicateCluster],
        target: &Path,
        events: &EventSender,
    ) -> Result<MoveSummary> {
        Ok(self
            .resolver
            .move_duplicates_with_events(clusters, target, events)?)
    }
}

/// Succeeds only when `path` names an existing directory
pub fn is_dir_exist(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DeduperError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FinderConfigError, IndexError};
    use std::fs;
    use tempfile::TempDir;

    fn deduper(dir: &Path, content: bool, perceptual: bool) -> Deduper {
        Deduper::builder()
            .index_dir(dir)
            .strategies(StrategySet::from_flags(content, perceptual))
            .workers(2)
            .build()
            .unwrap()
    }

    #[test]
    fn build_without_strategy_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = Deduper::builder().index_dir(temp_dir.path()).build();
        assert!(matches!(
            result,
            Err(DeduperError::Index(IndexError::NoStrategy))
        ));
    }

    #[test]
    fn is_dir_exist_accepts_directories_only() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(is_dir_exist(temp_dir.path()).is_ok());
        assert!(matches!(
            is_dir_exist(&temp_dir.path().join("not-there")),
            Err(DeduperError::DirectoryNotFound { .. })
        ));
        assert!(is_dir_exist(&file).is_err());
    }

    #[test]
    fn find_with_two_strategies_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let deduper = deduper(temp_dir.path(), true, true);

        let err = deduper.find().unwrap_err();

        assert!(matches!(
            err,
            DeduperError::Find(FindError::Config(FinderConfigError::MultipleStrategies))
        ));
    }

    #[test]
    fn create_find_and_move_round_trip() {
        let root = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let a = root.path().join("a").join("a.txt");
        let b = root.path().join("b").join("b.txt");
        let c = root.path().join("c.txt");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "hello").unwrap();
        fs::write(&b, "hello").unwrap();
        fs::write(&c, "world").unwrap();

        let indexing = deduper(root.path(), true, false);
        indexing.create(root.path()).unwrap();

        let finding = deduper(root.path(), true, false);
        assert_eq!(finding.load().unwrap(), 3);
        let clusters = finding.find().unwrap();
        assert_eq!(clusters.len(), 1);

        let summary = finding.move_duplicates(&clusters, target.path()).unwrap();

        assert_eq!(summary.moved, 1);
        assert!(a.exists());
        assert!(c.exists());
        assert!(!b.exists());
        assert!(target.path().join("b").join("b.txt").exists());
    }
}

//! # Indexer Module
//!
//! Builds the index of a directory tree and persists it.
//!
//! ## Flow
//! 1. The walker runs on the calling thread and streams paths
//! 2. Each path becomes one task on a bounded rayon pool
//! 3. Each task runs the composite hasher and merges the result
//! 4. When every task has finished, the index is saved
//!
//! The first walk or hash error wins: it trips a shared cancellation
//! flag so the walker stops discovering and queued tasks return without
//! hashing. A failed run never writes the index file.
//!
//! ## Example
//! ```rust,ignore
//! use deduplicater::core::indexer::Indexer;
//! use deduplicater::core::strategy::StrategySet;
//!
//! let indexer = Indexer::builder()
//!     .index_dir("/photos")
//!     .strategies(StrategySet::from_flags(true, false))
//!     .build()?;
//! let summary = indexer.create("/photos".as_ref())?;
//! println!("{} files indexed", summary.files);
//! ```

use crate::core::hasher::{CompositeHasher, FileHasher, HashedFile};
use crate::core::index::{Index, IndexStore};
use crate::core::scanner::{FileWalker, WalkDirWalker};
use crate::core::strategy::StrategySet;
use crate::error::IndexError;
use crate::events::{null_sender, Event, EventSender, IndexEvent, IndexProgress, IndexSummaryEvent};
use rayon::ThreadPool;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Tunables for an indexing run
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Hashing threads; 0 means one per CPU
    pub workers: usize,
    /// Minimum time between two progress events
    pub progress_interval: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            progress_interval: Duration::from_secs(5),
        }
    }
}

/// Outcome of a successful [`Indexer::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    /// Files discovered under the root
    pub files: usize,
    /// Records in the index after merging
    pub records: usize,
    /// Files a strategy declined to fingerprint
    pub skipped: usize,
    /// Wall time of the run
    pub duration: Duration,
}

/// Builder for [`Indexer`]
pub struct IndexerBuilder {
    index_dir: PathBuf,
    strategies: StrategySet,
    config: IndexerConfig,
    index: Option<Arc<Index>>,
    walker: Option<Box<dyn FileWalker>>,
    hashers: Option<Vec<Box<dyn FileHasher>>>,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self {
            index_dir: PathBuf::from("."),
            strategies: StrategySet::new(),
            config: IndexerConfig::default(),
            index: None,
            walker: None,
            hashers: None,
        }
    }

    /// Directory that holds the index file
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = dir.into();
        self
    }

    /// Signatures to compute for every file
    pub fn strategies(mut self, strategies: StrategySet) -> Self {
        self.strategies = strategies;
        self
    }

    /// Number of hashing threads (0 = one per CPU)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Minimum time between progress events
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// Share an existing index instead of starting from an empty one
    pub fn index(mut self, index: Arc<Index>) -> Self {
        self.index = Some(index);
        self
    }

    /// Use a custom walker (e.g., for testing)
    pub fn walker(mut self, walker: Box<dyn FileWalker>) -> Self {
        self.walker = Some(walker);
        self
    }

    /// Use custom hashers instead of the ones named by the strategies
    pub fn hashers(mut self, hashers: Vec<Box<dyn FileHasher>>) -> Self {
        self.hashers = Some(hashers);
        self
    }

    pub fn build(self) -> Result<Indexer, IndexError> {
        let hasher = match self.hashers {
            Some(hashers) => CompositeHasher::from_hashers(hashers)?,
            None => CompositeHasher::new(self.strategies)?,
        };

        let store = IndexStore::new(&self.index_dir);
        let walker = self
            .walker
            .unwrap_or_else(|| Box::new(WalkDirWalker::new().excluding(store.path())));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("deduplicater-hash-{}", i))
            .build()
            .map_err(|e| IndexError::ThreadPool(e.to_string()))?;

        Ok(Indexer {
            config: self.config,
            index: self.index.unwrap_or_default(),
            store,
            walker,
            hasher,
            pool,
        })
    }
}

impl Default for IndexerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state of one indexing run
struct Run {
    started: Instant,
    cancelled: AtomicBool,
    failure: OnceLock<IndexError>,
    discovered: AtomicUsize,
    indexed: AtomicUsize,
    skipped: AtomicUsize,
    last_progress: Mutex<Instant>,
}

impl Run {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            cancelled: AtomicBool::new(false),
            failure: OnceLock::new(),
            discovered: AtomicUsize::new(0),
            indexed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            last_progress: Mutex::new(now),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Record `error` unless an earlier one is already recorded, then cancel
    fn fail(&self, error: IndexError) {
        let _ = self.failure.set(error);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn progress(&self) -> IndexProgress {
        IndexProgress {
            indexed: self.indexed.load(Ordering::SeqCst),
            discovered: self.discovered.load(Ordering::SeqCst),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Emit a progress event if `interval` has passed since the last one.
    ///
    /// Workers that lose the race for the timestamp just carry on.
    fn report_progress(&self, interval: Duration, events: &EventSender) {
        let Ok(mut last) = self.last_progress.try_lock() else {
            return;
        };
        if last.elapsed() < interval {
            return;
        }
        *last = Instant::now();
        drop(last);

        let progress = self.progress();
        tracing::info!(
            indexed = progress.indexed,
            discovered = progress.discovered,
            elapsed_ms = progress.elapsed_ms,
            "indexing"
        );
        events.send(Event::Index(IndexEvent::Progress(progress)));
    }
}

/// Walks a directory, hashes every file and persists the index
pub struct Indexer {
    config: IndexerConfig,
    index: Arc<Index>,
    store: IndexStore,
    walker: Box<dyn FileWalker>,
    hasher: CompositeHasher,
    pool: ThreadPool,
}

impl Indexer {
    pub fn builder() -> IndexerBuilder {
        IndexerBuilder::new()
    }

    /// The index this indexer fills and loads
    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    /// Location of the index file
    pub fn index_file(&self) -> &Path {
        self.store.path()
    }

    /// Index `root` without progress reporting
    pub fn create(&self, root: &Path) -> Result<IndexSummary, IndexError> {
        self.create_with_events(root, &null_sender())
    }

    /// Index every regular file under `root` and save the index.
    ///
    /// Records are merged into the existing index, so running twice over
    /// the same tree yields the same records.
    pub fn create_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<IndexSummary, IndexError> {
        tracing::info!(
            root = %root.display(),
            workers = self.pool.current_num_threads(),
            "indexing started"
        );
        events.send(Event::Index(IndexEvent::Started {
            root: root.to_path_buf(),
        }));

        let run = Run::new();
        self.walk_and_hash(root, &run, events);

        if let Some(error) = run.failure.into_inner() {
            return Err(self.report_failure(error, events));
        }

        if let Err(error) = self.store.save(&self.index) {
            return Err(self.report_failure(error, events));
        }

        let summary = IndexSummary {
            files: run.discovered.into_inner(),
            records: self.index.len(),
            skipped: run.skipped.into_inner(),
            duration: run.started.elapsed(),
        };

        tracing::info!(
            files = summary.files,
            records = summary.records,
            skipped = summary.skipped,
            duration_ms = summary.duration.as_millis() as u64,
            "indexing completed"
        );
        events.send(Event::Index(IndexEvent::Completed(IndexSummaryEvent {
            files: summary.files,
            records: summary.records,
            duration_ms: summary.duration.as_millis() as u64,
        })));

        Ok(summary)
    }

    /// Replace the index contents with the saved index file.
    ///
    /// Returns the number of records loaded.
    pub fn load(&self) -> Result<usize, IndexError> {
        let records = self.store.load()?;
        self.index.replace(records);

        let count = self.index.len();
        tracing::info!(path = %self.store.path().display(), records = count, "index loaded");
        Ok(count)
    }

    /// Blocks until every spawned task has finished or bailed out
    fn walk_and_hash(&self, root: &Path, run: &Run, events: &EventSender) {
        let hasher = &self.hasher;
        let index = self.index.as_ref();
        let interval = self.config.progress_interval;

        self.pool.in_place_scope(|scope| {
            let walked = self.walker.walk(root, &mut |path| {
                if run.is_cancelled() {
                    return ControlFlow::Break(());
                }
                run.discovered.fetch_add(1, Ordering::SeqCst);

                scope.spawn(move |_| {
                    if run.is_cancelled() {
                        return;
                    }
                    hash_one(hasher, index, path, run, events);
                    run.report_progress(interval, events);
                });
                ControlFlow::Continue(())
            });

            if let Err(error) = walked {
                tracing::error!(path = %error.path().display(), %error, "walk failed");
                run.fail(error.into());
            }
        });
    }

    fn report_failure(&self, error: IndexError, events: &EventSender) -> IndexError {
        tracing::error!(%error, "indexing failed, index not saved");
        events.send(Event::Index(IndexEvent::Failed {
            message: error.to_string(),
        }));
        error
    }
}

fn hash_one(hasher: &CompositeHasher, index: &Index, path: PathBuf, run: &Run, events: &EventSender) {
    match hasher.hash_file(&path) {
        Ok(HashedFile { record, skipped }) => {
            if !skipped.is_empty() {
                run.skipped.fetch_add(1, Ordering::SeqCst);
            }
            for reason in skipped {
                events.send(Event::Index(IndexEvent::FileSkipped {
                    path: path.clone(),
                    reason,
                }));
            }
            if !record.is_empty() {
                tracing::debug!(path = %path.display(), "indexed");
                index.merge(record);
            }
            run.indexed.fetch_add(1, Ordering::SeqCst);
        }
        Err(error) => {
            tracing::error!(path = %error.path().display(), %error, "hashing failed");
            run.fail(error.into());
        }
    }
}

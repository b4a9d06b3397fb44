//! # Finder Module
//!
//! Groups index records into duplicate clusters.
//!
//! ## How It Works
//! 1. Walk the records in index order
//! 2. For each record whose signature has not been grouped yet, compare
//!    it with every later record
//! 3. The first match opens a cluster keyed by that signature; the
//!    signature is then never used to open another cluster
//!
//! Exactly one strategy may be active per search. Records that lack the
//! active signature are ignored.

mod strategies;

pub use strategies::{
    ContentDigestKey, ContentFinder, FinderStrategy, ImageFinder, KindMismatchPolicy,
};

use crate::core::index::{FileRecord, Index};
use crate::core::strategy::{Strategy, StrategySet};
use crate::error::{FindError, FinderConfigError};
use crate::events::{null_sender, Event, EventSender, FindEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Two or more files sharing one signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    /// Strategy that matched the files
    pub strategy: Strategy,
    /// Printable form of the shared signature
    pub signature: String,
    /// Members, in index order
    pub paths: Vec<PathBuf>,
}

impl DuplicateCluster {
    /// Members beyond the one that will be kept
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Pairwise scan with skip-once-grouped pruning.
///
/// Clusters are returned in the order their first member appears.
pub fn cluster_records<S: FinderStrategy>(
    strategy: &S,
    records: &[FileRecord],
) -> Result<Vec<DuplicateCluster>, FindError> {
    let keyed: Vec<_> = records
        .iter()
        .filter_map(|record| strategy.key(record).map(|key| (&record.path, key)))
        .collect();

    let mut grouped = HashSet::new();
    let mut clusters = Vec::new();

    for (i, (path, key)) in keyed.iter().enumerate() {
        if grouped.contains(key) {
            continue;
        }

        let mut members: Option<Vec<PathBuf>> = None;
        for (other_path, other_key) in &keyed[i + 1..] {
            let same = strategy
                .same(key, other_key)
                .map_err(|source| FindError::Compare {
                    path_a: path.to_path_buf(),
                    path_b: other_path.to_path_buf(),
                    source,
                })?;

            if same {
                members
                    .get_or_insert_with(|| vec![path.to_path_buf()])
                    .push(other_path.to_path_buf());
            }
        }

        if let Some(paths) = members {
            grouped.insert(key.clone());
            clusters.push(DuplicateCluster {
                strategy: strategy.strategy(),
                signature: key.to_string(),
                paths,
            });
        }
    }

    Ok(clusters)
}

/// The one strategy a finder runs
#[derive(Debug, Clone, Copy)]
enum ActiveFinder {
    Content(ContentFinder),
    Image(ImageFinder),
}

/// Finds duplicates in an index using exactly one strategy
pub struct CompositeFinder {
    active: ActiveFinder,
    index: Arc<Index>,
}

impl CompositeFinder {
    /// Fails unless exactly one strategy is enabled
    pub fn new(strategies: StrategySet, index: Arc<Index>) -> Result<Self, FinderConfigError> {
        Self::with_policy(strategies, index, KindMismatchPolicy::default())
    }

    /// Same as [`CompositeFinder::new`] with an explicit cross-kind policy
    pub fn with_policy(
        strategies: StrategySet,
        index: Arc<Index>,
        policy: KindMismatchPolicy,
    ) -> Result<Self, FinderConfigError> {
        let active = match (
            strategies.contains(Strategy::Content),
            strategies.contains(Strategy::Perceptual),
        ) {
            (false, false) => return Err(FinderConfigError::NoStrategy),
            (true, true) => return Err(FinderConfigError::MultipleStrategies),
            (true, false) => ActiveFinder::Content(ContentFinder),
            (false, true) => ActiveFinder::Image(ImageFinder::new(policy)),
        };

        Ok(Self { active, index })
    }

    /// Which strategy this finder compares by
    pub fn strategy(&self) -> Strategy {
        match &self.active {
            ActiveFinder::Content(finder) => finder.strategy(),
            ActiveFinder::Image(finder) => finder.strategy(),
        }
    }

    /// Group the current index contents
    pub fn find(&self) -> Result<Vec<DuplicateCluster>, FindError> {
        self.find_with_events(&null_sender())
    }

    /// Group the current index contents, reporting each cluster
    pub fn find_with_events(&self, events: &EventSender) -> Result<Vec<DuplicateCluster>, FindError> {
        let records = self.index.records();
        events.send(Event::Find(FindEvent::Started {
            records: records.len(),
        }));

        let clusters = match &self.active {
            ActiveFinder::Content(finder) => cluster_records(finder, &records)?,
            ActiveFinder::Image(finder) => cluster_records(finder, &records)?,
        };

        for cluster in &clusters {
            tracing::debug!(
                signature = %cluster.signature,
                size = cluster.paths.len(),
                "duplicate cluster"
            );
            events.send(Event::Find(FindEvent::ClusterFound {
                signature: cluster.signature.clone(),
                size: cluster.paths.len(),
            }));
        }

        let duplicates = clusters.iter().map(DuplicateCluster::duplicate_count).sum();
        tracing::info!(
            strategy = %self.strategy(),
            records = records.len(),
            clusters = clusters.len(),
            duplicates,
            "duplicate search completed"
        );
        events.send(Event::Find(FindEvent::Completed {
            clusters: clusters.len(),
            duplicates,
        }));

        Ok(clusters)
    }
}

//! # Core Module
//!
//! The duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Walks a directory tree
//! - `hasher` - Computes content and image signatures
//! - `index` - Holds and persists the signatures
//! - `indexer` - Drives walking and hashing in parallel
//! - `finder` - Groups records sharing a signature
//! - `resolver` - Moves duplicates under a target directory
//! - `deduper` - All of the above behind one type

pub mod deduper;
pub mod finder;
pub mod hasher;
pub mod index;
pub mod indexer;
pub mod resolver;
pub mod scanner;
pub mod strategy;

// Re-export commonly used types
pub use finder::{CompositeFinder, DuplicateCluster, KindMismatchPolicy};
pub use index::{FileRecord, Index};
pub use indexer::{IndexSummary, Indexer};
pub use resolver::{MoveSummary, Resolver};
pub use strategy::{Strategy, StrategySet};

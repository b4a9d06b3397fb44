//! # Scanner Module
//!
//! Enumerates the regular files under a root directory.
//!
//! Paths are handed to a callback as soon as they are discovered, so
//! hashing can start while the walk is still running. Any entry that
//! cannot be read ends the walk with a [`WalkError`]; a failed walk
//! salvages nothing.
//!
//! ## Example
//! ```rust,ignore
//! use deduplicater::core::scanner::{FileWalker, WalkDirWalker};
//! use std::ops::ControlFlow;
//!
//! let walker = WalkDirWalker::new();
//! let count = walker.walk("/photos".as_ref(), &mut |path| {
//!     println!("{}", path.display());
//!     ControlFlow::Continue(())
//! })?;
//! ```

mod walker;

pub use walker::WalkDirWalker;

use crate::error::WalkError;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Trait for file walkers
///
/// Implement this trait to feed the indexer from something other than
/// the local filesystem (e.g., in tests).
pub trait FileWalker: Send + Sync {
    /// Visit every regular file under `root`.
    ///
    /// Stops early when `visit` returns `ControlFlow::Break`. Returns the
    /// number of files visited.
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(PathBuf) -> ControlFlow<()>,
    ) -> Result<usize, WalkError>;
}

//! Directory walking implementation using walkdir.

use super::FileWalker;
use crate::error::WalkError;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walker over the local filesystem
#[derive(Debug, Clone, Default)]
pub struct WalkDirWalker {
    /// A file that is never yielded (the index file itself)
    exclude: Option<PathBuf>,
}

impl WalkDirWalker {
    /// Create a walker that yields every regular file
    pub fn new() -> Self {
        Self::default()
    }

    /// Never yield `path`
    pub fn excluding(mut self, path: impl AsRef<Path>) -> Self {
        self.exclude = std::path::absolute(path.as_ref()).ok();
        self
    }
}

impl FileWalker for WalkDirWalker {
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(PathBuf) -> ControlFlow<()>,
    ) -> Result<usize, WalkError> {
        let root = std::path::absolute(root).map_err(|source| WalkError::Access {
            path: root.to_path_buf(),
            source,
        })?;

        let mut visited = 0;

        for entry_result in WalkDir::new(&root).follow_links(false) {
            let entry = entry_result.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                WalkError::Access {
                    path,
                    source: e.into(),
                }
            })?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            if !file_type.is_file() {
                tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
                continue;
            }

            if self.exclude.as_deref() == Some(entry.path()) {
                continue;
            }

            // The index file stores paths as JSON strings
            if entry.path().to_str().is_none() {
                tracing::warn!(path = %entry.path().display(), "skipping path that is not valid UTF-8");
                continue;
            }

            visited += 1;
            if visit(entry.into_path()).is_break() {
                break;
            }
        }

        Ok(visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(walker: &WalkDirWalker, root: &Path) -> Result<Vec<PathBuf>, WalkError> {
        let mut found = Vec::new();
        walker.walk(root, &mut |path| {
            found.push(path);
            ControlFlow::Continue(())
        })?;
        found.sort();
        Ok(found)
    }

    #[test]
    fn walk_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let found = collect(&WalkDirWalker::new(), temp_dir.path()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn walk_yields_nested_files_but_not_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("hello").join("foo");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("bar.txt"), "content: bar").unwrap();
        fs::write(temp_dir.path().join("top.txt"), "top").unwrap();

        let found = collect(&WalkDirWalker::new(), temp_dir.path()).unwrap();

        assert_eq!(
            found,
            vec![nested.join("bar.txt"), temp_dir.path().join("top.txt")]
        );
    }

    #[test]
    fn walk_includes_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".hidden"), "x").unwrap();

        let found = collect(&WalkDirWalker::new(), temp_dir.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn walk_nonexistent_root_fails_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("not-valid");

        let err = collect(&WalkDirWalker::new(), &missing).unwrap_err();
        assert_eq!(err.path(), &missing);
    }

    #[test]
    fn walk_skips_excluded_file() {
        let temp_dir = TempDir::new().unwrap();
        let index_file = temp_dir.path().join(".duplicate-index.json");
        fs::write(&index_file, "[]").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let walker = WalkDirWalker::new().excluding(&index_file);
        let found = collect(&walker, temp_dir.path()).unwrap();

        assert_eq!(found, vec![temp_dir.path().join("a.txt")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn walk_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("ok.txt"), "ok").unwrap();
        fs::write(temp_dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")), "ok").unwrap();

        let found = collect(&WalkDirWalker::new(), temp_dir.path()).unwrap();
        assert_eq!(found, vec![temp_dir.path().join("ok.txt")]);
    }

    #[test]
    fn walk_stops_when_visitor_breaks() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(temp_dir.path().join(format!("{}.txt", i)), "x").unwrap();
        }

        let mut seen = 0;
        let visited = WalkDirWalker::new()
            .walk(temp_dir.path(), &mut |_| {
                seen += 1;
                ControlFlow::Break(())
            })
            .unwrap();

        assert_eq!(seen, 1);
        assert_eq!(visited, 1);
    }
}

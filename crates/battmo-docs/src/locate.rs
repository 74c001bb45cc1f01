//! # Source-File Locator
//!
//! Finds a file by exact name inside the project tree.
//!
//! ## Traversal Order
//!
//! The walk is top-down: the files of a directory are examined before any
//! of its subdirectories, and siblings are visited in byte-wise name
//! order. When the same name exists in several places the first one in
//! that order wins, so `foo.m` at the root beats `a/foo.m`, and `a/foo.m`
//! beats `b/foo.m`.
//!
//! Directories whose name is in the ignored set are pruned at every depth
//! and never entered. Unreadable entries are skipped with a warning.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::DocsError;

/// Searches a directory tree for source files.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    root: PathBuf,
    ignored_dirs: Vec<String>,
    extension: String,
}

impl SourceLocator {
    /// Create a locator over `root`, skipping the given directory names.
    ///
    /// `extension` (without the dot) is appended by [`locate_identifier`](Self::locate_identifier).
    pub fn new(
        root: impl Into<PathBuf>,
        ignored_dirs: impl IntoIterator<Item = impl Into<String>>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            ignored_dirs: ignored_dirs.into_iter().map(Into::into).collect(),
            extension: extension.into(),
        }
    }

    /// Root of the searched tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory names that are never descended into.
    pub fn ignored_dirs(&self) -> &[String] {
        &self.ignored_dirs
    }

    /// Locate `<identifier>.<extension>`.
    pub fn locate_identifier(&self, identifier: &str) -> Result<PathBuf, DocsError> {
        self.locate(&format!("{identifier}.{}", self.extension))
    }

    /// Locate a file by exact name.
    ///
    /// Returns the path relative to the root; joining it with
    /// [`root`](Self::root) yields the file.
    ///
    /// # Errors
    ///
    /// `DocsError::FileNotFound` naming `filename` if no file matches.
    pub fn locate(&self, filename: &str) -> Result<PathBuf, DocsError> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name() == filename {
                let relative = entry
                    .path()
                    .strip_prefix(&self.root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                tracing::debug!(filename, path = %relative.display(), "located source file");
                return Ok(relative);
            }
        }

        Err(DocsError::FileNotFound {
            filename: filename.to_string(),
            root: self.root.clone(),
        })
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        // The root is searched even if its own name is on the list.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let pruned = entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.ignored_dirs.iter().any(|d| d == name));
        if pruned {
            tracing::trace!(path = %entry.path().display(), "pruned ignored directory");
        }
        pruned
    }
}

/// Files sort before directories; within each group, by name.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

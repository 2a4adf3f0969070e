//! Directory traversal for the archiver
//!
//! [`FileWalker`] walks a root directory depth-first and yields one [`WalkedEntry`] per
//! archivable entry. Directories themselves are never yielded; their structure survives
//! only through the paths of the entries below them.
//!
//! ## Symbolic links
//!
//! - Not following (default): symlinked directories are not descended, a symlink to a
//!   file or a dangling symlink is yielded as [`EntryKind::Symlink`].
//! - Following: symlinked directories are descended. A link pointing back at one of its
//!   ancestors is skipped with a warning, so cycles terminate. Dangling links are
//!   skipped with a warning.
//!
//! ## Skipped entries
//!
//! FIFOs, sockets and device nodes are skipped, as is anything registered through
//! [`FileWalker::with_skip_paths`] (the archive being written, for instance). The count
//! is available from [`Walk::skipped`] once iteration is done.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tarball::walker::FileWalker;
//!
//! # fn main() -> tarball::Result<()> {
//! let walker = FileWalker::new("./project").with_sorted(true);
//! for entry in walker.walk() {
//!     let entry = entry?;
//!     println!("{} ({} bytes)", entry.path.display(), entry.size);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TarballError};
use crate::types::{EntryKind, WalkedEntry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Recursive walker over a directory tree
#[derive(Debug, Clone)]
pub struct FileWalker {
    /// Directory to walk
    root: PathBuf,
    /// Whether to descend into symlinked directories
    follow_symlinks: bool,
    /// Visit entries in file name order
    sorted: bool,
    /// Canonical paths never yielded
    skip_paths: Vec<PathBuf>,
}

impl FileWalker {
    /// Create a walker that does not follow symlinks and sorts by file name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            sorted: true,
            skip_paths: Vec::new(),
        }
    }

    /// Set symbolic link following behavior
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Visit directory entries in file name order (otherwise filesystem order)
    pub fn with_sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Never yield these files, even when they live under the root
    ///
    /// Paths need not exist yet; they are matched by canonical location.
    pub fn with_skip_paths<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.skip_paths = paths.into_iter().map(|p| canonical_location(&p)).collect();
        self
    }

    /// Root directory being walked
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a traversal
    ///
    /// The iterator is lazy: entries are discovered as they are consumed, and the first
    /// traversal error ends the useful part of the walk.
    pub fn walk(&self) -> Walk<'_> {
        let mut walkdir = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        if self.sorted {
            walkdir = walkdir.sort_by_file_name();
        }
        Walk {
            walker: self,
            inner: walkdir.into_iter(),
            skipped: 0,
        }
    }

    fn is_skipped(&self, path: &Path) -> bool {
        if self.skip_paths.is_empty() {
            return false;
        }
        let name = path.file_name();
        if !self.skip_paths.iter().any(|skip| skip.file_name() == name) {
            return false;
        }
        self.skip_paths.contains(&canonical_location(path))
    }
}

/// Lazy traversal created by [`FileWalker::walk`]
pub struct Walk<'a> {
    walker: &'a FileWalker,
    inner: walkdir::IntoIter,
    skipped: usize,
}

impl Walk<'_> {
    /// Entries seen so far that were not yielded
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip_walk_error(&mut self, err: &walkdir::Error) -> bool {
        if let Some(ancestor) = err.loop_ancestor() {
            warn!(
                "Skipping symlink cycle at {:?} (leads back to {:?})",
                err.path(),
                ancestor
            );
            return true;
        }

        if self.walker.follow_symlinks && err.depth() > 0 {
            let dangling = err.path().is_some_and(|path| {
                fs::symlink_metadata(path)
                    .map(|meta| meta.file_type().is_symlink())
                    .unwrap_or(false)
                    && !path.exists()
            });
            if dangling {
                warn!("Skipping dangling symlink {:?}", err.path());
                return true;
            }
        }

        false
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<WalkedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    if self.skip_walk_error(&err) {
                        self.skipped += 1;
                        continue;
                    }
                    return Some(Err(TarballError::from_walk(err)));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                trace!("Entering {:?}", entry.path());
                continue;
            }

            if self.walker.is_skipped(entry.path()) {
                debug!("Skipping {:?}", entry.path());
                self.skipped += 1;
                continue;
            }

            if file_type.is_file() {
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(err) => return Some(Err(TarballError::from_walk(err))),
                };
                return Some(Ok(WalkedEntry {
                    path: entry.into_path(),
                    kind: EntryKind::File,
                    size,
                }));
            }

            if file_type.is_symlink() {
                if entry.path().is_dir() {
                    debug!("Not descending into symlinked directory {:?}", entry.path());
                    self.skipped += 1;
                    continue;
                }
                return Some(Ok(WalkedEntry {
                    path: entry.into_path(),
                    kind: EntryKind::Symlink,
                    size: 0,
                }));
            }

            warn!("Skipping special file {:?}", entry.path());
            self.skipped += 1;
        }
    }
}

/// Canonical form of `path`, resolving the parent when the file does not exist yet
fn canonical_location(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

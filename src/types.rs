//! Core types used throughout the tarball library
//!
//! Configuration, reporting and progress types shared by the archiver, the walker
//! and the command line front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Archive file name used when no output path is configured
pub const DEFAULT_OUTPUT_NAME: &str = "rootbase.tar.gz";

/// How walked paths become member names inside the archive
///
/// # Examples
///
/// ```rust
/// use tarball::EntryNaming;
///
/// // Walking `data` containing `sub/b.txt`:
/// // AsWalked       -> "data/sub/b.txt"
/// // RelativeToRoot -> "sub/b.txt"
/// assert_eq!(EntryNaming::default(), EntryNaming::AsWalked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryNaming {
    /// Root joined with the relative path, as encountered during the walk
    #[default]
    AsWalked,
    /// Path relative to the root directory
    RelativeToRoot,
}

/// Configuration for an [`Archiver`](crate::Archiver)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Where the `.tar.gz` is written
    pub output_path: PathBuf,
    /// Member naming scheme
    pub naming: EntryNaming,
    /// Whether to descend into symlinked directories
    pub follow_symlinks: bool,
    /// Visit directory entries in file name order
    pub sort_entries: bool,
    /// Write through a temporary file renamed into place on success
    ///
    /// Off by default: a failed run leaves the partial archive at the output path.
    pub atomic: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_NAME),
            naming: EntryNaming::default(),
            follow_symlinks: false,
            sort_entries: true,
            atomic: false,
        }
    }
}

/// Kind of entry the walker hands to the archiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file (or a followed symlink to one)
    File,
    /// Symlink stored as a link member
    Symlink,
}

/// A single archivable entry found during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedEntry {
    /// Walk root joined with the entry's relative path
    pub path: PathBuf,
    /// Entry kind
    pub kind: EntryKind,
    /// Size in bytes (0 for symlinks)
    pub size: u64,
}

impl WalkedEntry {
    /// Path of the entry relative to `root`, falling back to the walked path
    pub fn relative_to<'a>(&'a self, root: &Path) -> &'a Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}

/// Outcome of a successful archive run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveReport {
    /// Final location of the archive
    pub output_path: PathBuf,
    /// Regular file members written
    pub files_added: usize,
    /// Symlink members written
    pub symlinks_added: usize,
    /// Entries seen but not archived (special files, cycles, the archive itself)
    pub entries_skipped: usize,
    /// Source bytes read into the archive
    pub bytes_read: u64,
    /// Size of the compressed archive on disk
    pub archive_size: u64,
    /// Wall clock time of the run
    pub duration: Duration,
    /// When the archive was finalized
    pub created_at: DateTime<Utc>,
}

impl ArchiveReport {
    /// Total members in the archive
    pub fn member_count(&self) -> usize {
        self.files_added + self.symlinks_added
    }
}

/// Progress callback for long-running operations
pub type ProgressCallback = Arc<dyn Fn(ProgressInfo) + Send + Sync>;

/// Information passed to progress callbacks
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Operation being performed
    pub operation: String,
    /// Current item being processed
    pub current_item: Option<String>,
    /// Items processed so far
    pub processed: usize,
    /// Bytes processed so far
    pub bytes_processed: u64,
}

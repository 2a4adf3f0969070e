//! The archive operation
//!
//! [`Archiver`] walks a root directory and streams every regular file it finds into a
//! gzip-compressed tar file. Members are appended as they are discovered; nothing is
//! buffered beyond the current file.
//!
//! The open archive is a chain of owned writers (`tar::Builder` over `GzEncoder` over
//! [`OutputFile`]). Each layer finalizes itself when dropped, so an error halfway
//! through still writes the tar trailer, flushes the gzip stream and closes the file.
//! By default the archive is written in place, so the partial archive stays at the
//! output path. In atomic mode the unfinished temporary file is removed instead and
//! whatever was at the output path before is left untouched.

use crate::error::{Result, TarballError};
use crate::types::{
    ArchiveConfig, ArchiveReport, EntryKind, EntryNaming, ProgressCallback, ProgressInfo,
};
use crate::utils::{member_name, OutputFile};
use crate::verification::{ArchiveVerifier, VerificationReport};
use crate::walker::FileWalker;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Archive a directory into `rootbase.tar.gz` in the current directory
///
/// Shorthand for `Archiver::default().archive(root)`.
pub fn archive(root: impl AsRef<Path>) -> Result<ArchiveReport> {
    Archiver::default().archive(root)
}

/// Writes directory trees into `.tar.gz` archives
///
/// # Example
///
/// ```rust,no_run
/// use tarball::{ArchiverBuilder, EntryNaming};
///
/// # fn main() -> tarball::Result<()> {
/// let archiver = ArchiverBuilder::new()
///     .output_path("backup.tar.gz")
///     .naming(EntryNaming::RelativeToRoot)
///     .build()?;
///
/// let report = archiver.archive("./data")?;
/// println!("{} members, {} bytes", report.member_count(), report.archive_size);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Archiver {
    config: ArchiveConfig,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for Archiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archiver")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Archiver {
    /// Archiver writing to `output_path` with default settings otherwise
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            config: ArchiveConfig {
                output_path: output_path.into(),
                ..ArchiveConfig::default()
            },
            progress: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Where archives are written
    pub fn output_path(&self) -> &Path {
        &self.config.output_path
    }

    /// Walker configured the way this archiver traverses `root`
    pub fn walker(&self, root: impl Into<PathBuf>) -> FileWalker {
        FileWalker::new(root)
            .with_follow_symlinks(self.config.follow_symlinks)
            .with_sorted(self.config.sort_entries)
    }

    /// Write every regular file under `root` into the configured archive
    ///
    /// The root is checked before the output is opened, so a missing root never
    /// creates or truncates anything. The first failure aborts the whole run.
    ///
    /// # Errors
    ///
    /// - [`TarballError::PathNotFound`] if `root` does not exist
    /// - [`TarballError::NotADirectory`] if `root` is not a directory
    /// - [`TarballError::PermissionDenied`] if a source is unreadable or the output unwritable
    /// - [`TarballError::IoFailure`] for any other I/O failure, e.g. a full disk
    pub fn archive(&self, root: impl AsRef<Path>) -> Result<ArchiveReport> {
        let root = root.as_ref();
        let start = Instant::now();
        info!("Archiving {:?} into {:?}", root, self.config.output_path);

        validate_root(root)?;

        let output = OutputFile::create(&self.config.output_path, self.config.atomic)?;
        let target = output.target().to_path_buf();
        let walker = self
            .walker(root)
            .with_skip_paths(vec![target.clone(), output.staging_path().to_path_buf()]);

        let mut builder = tar::Builder::new(GzEncoder::new(output, Compression::default()));
        builder.follow_symlinks(self.config.follow_symlinks);

        let mut files_added = 0usize;
        let mut symlinks_added = 0usize;
        let mut bytes_read = 0u64;

        let mut walk = walker.walk();
        for entry in walk.by_ref() {
            let entry = entry?;
            let name = member_name(&entry.path, root, self.config.naming)?;
            trace!("Adding {:?} as {:?}", entry.path, name);

            builder
                .append_path_with_name(&entry.path, &name)
                .map_err(|e| TarballError::from_io(e, &entry.path))?;

            match entry.kind {
                EntryKind::File => {
                    files_added += 1;
                    bytes_read += entry.size;
                }
                EntryKind::Symlink => symlinks_added += 1,
            }

            if let Some(callback) = &self.progress {
                callback(ProgressInfo {
                    operation: "Archiving".to_string(),
                    current_item: Some(name.display().to_string()),
                    processed: files_added + symlinks_added,
                    bytes_processed: bytes_read,
                });
            }
        }
        let entries_skipped = walk.skipped();

        debug!("Finalizing archive with {} members", files_added + symlinks_added);
        let encoder = builder
            .into_inner()
            .map_err(|e| TarballError::from_io(e, &target))?;
        let output = encoder
            .finish()
            .map_err(|e| TarballError::from_io(e, &target))?;
        let output_path = output.commit()?;

        let archive_size = fs::metadata(&output_path)
            .map_err(|e| TarballError::from_io(e, &output_path))?
            .len();

        let report = ArchiveReport {
            output_path,
            files_added,
            symlinks_added,
            entries_skipped,
            bytes_read,
            archive_size,
            duration: start.elapsed(),
            created_at: Utc::now(),
        };
        info!(
            "Archived {} files ({} symlinks, {} skipped) into {:?}",
            report.files_added, report.symlinks_added, report.entries_skipped, report.output_path
        );
        Ok(report)
    }

    /// Compare the configured archive with the tree under `root`
    ///
    /// Uses the same naming and symlink policy as [`Archiver::archive`], so a fresh
    /// archive of an unchanged tree always verifies.
    pub fn verify(&self, root: impl AsRef<Path>) -> Result<VerificationReport> {
        let root = root.as_ref();
        validate_root(root)?;
        let walker = self
            .walker(root)
            .with_skip_paths(vec![self.config.output_path.clone()]);
        ArchiveVerifier::new(walker, self.config.naming).verify(&self.config.output_path)
    }
}

/// Builder for [`Archiver`]
#[derive(Default)]
pub struct ArchiverBuilder {
    config: ArchiveConfig,
    progress: Option<ProgressCallback>,
}

impl ArchiverBuilder {
    /// Create a new builder with default settings
    ///
    /// ```rust
    /// use tarball::ArchiverBuilder;
    ///
    /// let archiver = ArchiverBuilder::new().build().unwrap();
    /// assert_eq!(archiver.output_path(), std::path::Path::new("rootbase.tar.gz"));
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Set where the archive is written
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// Set how walked paths become member names
    pub fn naming(mut self, naming: EntryNaming) -> Self {
        self.config.naming = naming;
        self
    }

    /// Descend into symlinked directories and store link targets' contents
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Visit entries in file name order
    pub fn sort_entries(mut self, sorted: bool) -> Self {
        self.config.sort_entries = sorted;
        self
    }

    /// Write through a temporary file renamed into place on success
    ///
    /// Disabled by default, in which case a failed run leaves a partial archive at the
    /// output path.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.config.atomic = atomic;
        self
    }

    /// Set a callback invoked after each member is written
    pub fn progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressInfo) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Validate the configuration and build the archiver
    ///
    /// # Errors
    ///
    /// - [`TarballError::InvalidConfiguration`] if the output path has no file name
    pub fn build(self) -> Result<Archiver> {
        if self.config.output_path.file_name().is_none() {
            return Err(TarballError::InvalidConfiguration(format!(
                "output path {:?} does not name a file",
                self.config.output_path
            )));
        }
        Ok(Archiver {
            config: self.config,
            progress: self.progress,
        })
    }
}

fn validate_root(root: &Path) -> Result<()> {
    let meta = fs::metadata(root).map_err(|e| TarballError::from_io(e, root))?;
    if !meta.is_dir() {
        return Err(TarballError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

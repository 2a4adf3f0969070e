//! Utility functions for the tarball library
//!
//! ### Member names
//! Tar members must be relative and free of `..`. [`member_name`] turns a walked path
//! into a valid member name the way tar tools do: leading `/` (and Windows prefixes) are
//! stripped, `.` components vanish and everything up to the last `..` is dropped.
//!
//! ### Output file
//! [`OutputFile`] is the sink the gzip encoder writes into. In atomic mode it is a
//! temporary sibling of the target that only becomes visible through
//! [`OutputFile::commit`]; dropping it without committing removes the temporary file.
//! In direct mode the target itself is truncated and written.

use crate::error::{Result, TarballError};
use crate::types::EntryNaming;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Turn a walked path into a tar member name
///
/// # Errors
///
/// - [`TarballError::InvalidEntryName`] if nothing remains after sanitising
///
/// # Example
///
/// ```rust,ignore
/// use crate::utils::member_name;
/// use crate::types::EntryNaming;
/// use std::path::Path;
///
/// let name = member_name(Path::new("/data/sub/b.txt"), Path::new("/data"), EntryNaming::AsWalked)?;
/// assert_eq!(name, Path::new("data/sub/b.txt"));
///
/// let name = member_name(Path::new("/data/sub/b.txt"), Path::new("/data"), EntryNaming::RelativeToRoot)?;
/// assert_eq!(name, Path::new("sub/b.txt"));
/// ```
pub fn member_name(path: &Path, root: &Path, naming: EntryNaming) -> Result<PathBuf> {
    let source = match naming {
        EntryNaming::AsWalked => path,
        EntryNaming::RelativeToRoot => path.strip_prefix(root).unwrap_or(path),
    };

    let mut name = PathBuf::new();
    for component in source.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => name = PathBuf::new(),
            Component::Normal(part) => name.push(part),
        }
    }

    if name.as_os_str().is_empty() {
        return Err(TarballError::InvalidEntryName(path.to_path_buf()));
    }
    if name.as_path() != source {
        trace!("Member name for {:?} sanitized to {:?}", path, name);
    }
    Ok(name)
}

/// Destination of the compressed archive stream
#[derive(Debug)]
pub enum OutputFile {
    /// Temporary sibling of `target`, renamed over it on commit
    Atomic {
        /// Open temporary file
        temp: NamedTempFile,
        /// Final archive location
        target: PathBuf,
    },
    /// The target itself, written in place
    Direct {
        /// Open target file
        file: File,
        /// Archive location
        path: PathBuf,
    },
}

impl OutputFile {
    /// Open the output for writing, truncating any direct target
    ///
    /// # Errors
    ///
    /// - [`TarballError::InvalidConfiguration`] if `path` does not name a file
    /// - [`TarballError::PermissionDenied`] if the output directory is not writable
    /// - [`TarballError::PathNotFound`] if the output directory does not exist
    pub fn create(path: &Path, atomic: bool) -> Result<Self> {
        let file_name = path.file_name().ok_or_else(|| {
            TarballError::InvalidConfiguration(format!(
                "output path {:?} does not name a file",
                path
            ))
        })?;

        if !atomic {
            let file = File::create(path).map_err(|e| TarballError::from_io(e, path))?;
            debug!("Writing archive directly to {:?}", path);
            return Ok(OutputFile::Direct {
                file,
                path: path.to_path_buf(),
            });
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut prefix = OsString::from(".");
        prefix.push(file_name);
        prefix.push(".");

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".tmp");
        // Same mode File::create would give the target, umask included
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let temp = builder
            .tempfile_in(dir)
            .map_err(|e| TarballError::from_io(e, dir))?;

        debug!("Staging archive for {:?} in {:?}", path, temp.path());
        Ok(OutputFile::Atomic {
            temp,
            target: path.to_path_buf(),
        })
    }

    /// Path currently being written
    pub fn staging_path(&self) -> &Path {
        match self {
            OutputFile::Atomic { temp, .. } => temp.path(),
            OutputFile::Direct { path, .. } => path,
        }
    }

    /// Final archive location
    pub fn target(&self) -> &Path {
        match self {
            OutputFile::Atomic { target, .. } => target,
            OutputFile::Direct { path, .. } => path,
        }
    }

    /// Flush to disk and, in atomic mode, rename over the target
    pub fn commit(self) -> Result<PathBuf> {
        match self {
            OutputFile::Atomic { temp, target } => {
                temp.as_file()
                    .sync_all()
                    .map_err(|e| TarballError::from_io(e, temp.path()))?;
                temp.persist(&target)
                    .map_err(|e| TarballError::from_io(e.error, &target))?;
                Ok(target)
            }
            OutputFile::Direct { file, path } => {
                file.sync_all().map_err(|e| TarballError::from_io(e, &path))?;
                Ok(path)
            }
        }
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Atomic { temp, .. } => temp.write(buf),
            OutputFile::Direct { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Atomic { temp, .. } => temp.flush(),
            OutputFile::Direct { file, .. } => file.flush(),
        }
    }
}

/// Format bytes in human-readable form
///
/// Uses binary units (1024-based). Values under 1 KB are whole numbers,
/// everything else has two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

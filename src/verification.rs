//! Reading archives back and checking them against the source tree
//!
//! Verification decodes a `.tar.gz`, hashes every regular member with SHA-256 and
//! compares the result with what the walker finds under the root today, using the same
//! naming scheme the archive was written with. Three kinds of problems are reported:
//!
//! - **missing**: present in the tree, absent from the archive
//! - **unexpected**: present in the archive, absent from the tree
//! - **mismatched**: present in both, but the kind or content differs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tarball::Archiver;
//!
//! # fn main() -> tarball::Result<()> {
//! let archiver = Archiver::new("rootbase.tar.gz");
//! archiver.archive("./data")?;
//!
//! let report = archiver.verify("./data")?;
//! if !report.is_valid() {
//!     println!("{}", report.summary());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TarballError};
use crate::types::{EntryKind, EntryNaming};
use crate::utils::member_name;
use crate::walker::FileWalker;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Kind of a member stored in an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Regular file
    File,
    /// Symbolic link
    Symlink,
    /// Directory entry
    Directory,
    /// Anything else (hard links, devices, FIFOs, ...)
    Other,
}

impl From<tar::EntryType> for MemberKind {
    fn from(entry_type: tar::EntryType) -> Self {
        match entry_type {
            tar::EntryType::Regular | tar::EntryType::Continuous => MemberKind::File,
            tar::EntryType::Symlink => MemberKind::Symlink,
            tar::EntryType::Directory => MemberKind::Directory,
            _ => MemberKind::Other,
        }
    }
}

impl From<EntryKind> for MemberKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => MemberKind::File,
            EntryKind::Symlink => MemberKind::Symlink,
        }
    }
}

/// Header information for one archive member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Member name
    pub name: PathBuf,
    /// Member kind
    pub kind: MemberKind,
    /// Content size in bytes
    pub size: u64,
    /// Unix permission bits
    pub mode: u32,
    /// Modification time (seconds since the epoch)
    pub mtime: u64,
}

/// A member present on both sides whose kind or content differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMismatch {
    /// Member name
    pub name: PathBuf,
    /// What the tree holds
    pub expected: String,
    /// What the archive holds
    pub actual: String,
}

/// Result of comparing an archive with a directory tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Archive that was read
    pub archive_path: PathBuf,
    /// Members found identical on both sides
    pub members_checked: usize,
    /// In the tree but not in the archive
    pub missing: Vec<PathBuf>,
    /// In the archive but not in the tree
    pub unexpected: Vec<PathBuf>,
    /// In both, but different
    pub mismatched: Vec<MemberMismatch>,
}

impl VerificationReport {
    /// Whether archive and tree agree
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mismatched.is_empty()
    }

    /// One-line summary of the result
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "{:?}: {} members verified",
                self.archive_path, self.members_checked
            )
        } else {
            format!(
                "{:?}: {} verified, {} missing, {} unexpected, {} mismatched",
                self.archive_path,
                self.members_checked,
                self.missing.len(),
                self.unexpected.len(),
                self.mismatched.len()
            )
        }
    }
}

/// Describe every member of a `.tar.gz`
///
/// # Errors
///
/// - [`TarballError::PathNotFound`] if the archive does not exist
/// - [`TarballError::IoFailure`] if it is not a valid gzip-compressed tar
pub fn list_members(archive_path: &Path) -> Result<Vec<MemberInfo>> {
    let mut members = Vec::new();
    for_each_member(archive_path, |info, _| {
        members.push(info);
        Ok(())
    })?;
    Ok(members)
}

/// Compares archives with the tree a [`FileWalker`] sees
#[derive(Debug, Clone)]
pub struct ArchiveVerifier {
    walker: FileWalker,
    naming: EntryNaming,
}

#[derive(Debug, PartialEq, Eq)]
struct Fingerprint {
    kind: MemberKind,
    digest: Option<String>,
}

impl Fingerprint {
    fn describe(&self) -> String {
        match &self.digest {
            Some(digest) => format!("{:?} sha256:{}", self.kind, digest),
            None => format!("{:?}", self.kind),
        }
    }
}

impl ArchiveVerifier {
    /// Verifier walking with `walker` and naming members with `naming`
    pub fn new(walker: FileWalker, naming: EntryNaming) -> Self {
        Self { walker, naming }
    }

    /// Compare `archive_path` with the walker's root
    ///
    /// Returns a report in every case where both sides could be read; an invalid report
    /// is not an error.
    pub fn verify(&self, archive_path: &Path) -> Result<VerificationReport> {
        info!(
            "Verifying {:?} against {:?}",
            archive_path,
            self.walker.root()
        );

        let mut archived: BTreeMap<PathBuf, Fingerprint> = BTreeMap::new();
        for_each_member(archive_path, |info, reader| {
            let digest = match info.kind {
                MemberKind::File => Some(hash_reader(reader)?),
                _ => None,
            };
            if archived
                .insert(info.name.clone(), Fingerprint { kind: info.kind, digest })
                .is_some()
            {
                warn!("Duplicate member {:?} in archive", info.name);
            }
            Ok(())
        })?;

        let root = self.walker.root();
        let mut report = VerificationReport {
            archive_path: archive_path.to_path_buf(),
            ..VerificationReport::default()
        };

        for entry in self.walker.walk() {
            let entry = entry?;
            let name = member_name(&entry.path, root, self.naming)?;
            let expected = Fingerprint {
                kind: entry.kind.into(),
                digest: match entry.kind {
                    EntryKind::File => Some(hash_file(&entry.path)?),
                    EntryKind::Symlink => None,
                },
            };

            match archived.remove(&name) {
                None => {
                    debug!("Missing from archive: {:?}", name);
                    report.missing.push(name);
                }
                Some(actual) if actual != expected => {
                    debug!("Mismatch for {:?}", name);
                    report.mismatched.push(MemberMismatch {
                        name,
                        expected: expected.describe(),
                        actual: actual.describe(),
                    });
                }
                Some(_) => report.members_checked += 1,
            }
        }

        report.unexpected = archived
            .into_iter()
            .filter(|(_, fp)| fp.kind != MemberKind::Directory)
            .map(|(name, _)| name)
            .collect();

        info!("{}", report.summary());
        Ok(report)
    }
}

/// Visit every member of a `.tar.gz` with its header info and content reader
fn for_each_member<F>(archive_path: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(MemberInfo, &mut dyn Read) -> Result<()>,
{
    let io_err = |e: io::Error| TarballError::from_io(e, archive_path);

    let file = File::open(archive_path).map_err(io_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

    for entry in archive.entries().map_err(io_err)? {
        let mut entry = entry.map_err(io_err)?;
        let header = entry.header();
        let info = MemberInfo {
            name: entry.path().map_err(io_err)?.into_owned(),
            kind: header.entry_type().into(),
            size: entry.size(),
            mode: header.mode().map_err(io_err)?,
            mtime: header.mtime().map_err(io_err)?,
        };
        visit(info, &mut entry)?;
    }
    Ok(())
}

fn hash_reader(reader: &mut dyn Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| TarballError::from_io(e, path))?;
    hash_reader(&mut file).map_err(|e| match e {
        TarballError::Io(io_err) => TarballError::from_io(io_err, path),
        other => other,
    })
}

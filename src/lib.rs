//! # tarball - directory trees into `.tar.gz`
//!
//! Walks a directory recursively and writes every regular file it finds into a single
//! gzip-compressed tar archive, by default `rootbase.tar.gz` in the current directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Writes ./rootbase.tar.gz
//! let report = tarball::archive("./data")?;
//! println!("Archived {} files", report.files_added);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use tarball::{ArchiverBuilder, EntryNaming};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archiver = ArchiverBuilder::new()
//!     .output_path("/backups/data.tar.gz")
//!     .naming(EntryNaming::RelativeToRoot) // "sub/b.txt" instead of "data/sub/b.txt"
//!     .follow_symlinks(true)
//!     .atomic(true)
//!     .build()?;
//!
//! archiver.archive("./data")?;
//! assert!(archiver.verify("./data")?.is_valid());
//! # Ok(())
//! # }
//! ```
//!
//! ## Behavior
//!
//! - Only files become members; directories are implied by member paths
//! - By default a member is named by the path it was walked under (root joined with
//!   the relative path), minus any leading `/` or `..`
//! - The root is validated before the output is opened: a missing root never creates
//!   or truncates the archive
//! - The first unreadable file aborts the run
//! - Output is written in place, so a failed run leaves a partial (but well-formed)
//!   archive behind; atomic mode writes a temporary file renamed into place on success
//! - Symlinks are not followed by default; when following, cycles are detected and
//!   skipped
//! - The archive never contains itself, even when written inside the walked tree
//!
//! ## Error Handling
//!
//! All operations return `Result<T, TarballError>`. The variants callers usually
//! match on are `PathNotFound`, `PermissionDenied` and `IoFailure`.
//!
//! ## Module Organization
//!
//! - [`archiver`]: the archive operation and its builder
//! - [`walker`]: directory traversal
//! - [`verification`]: reading archives back and comparing them with a tree
//! - [`types`]: configuration and report types
//! - [`error`]: error types and handling

pub mod archiver;
pub mod error;
pub mod types;
pub mod verification;
pub mod walker;

mod utils;

pub use archiver::{archive, Archiver, ArchiverBuilder};
pub use error::{Result, TarballError};
pub use types::*;
pub use utils::format_bytes;
pub use verification::{list_members, ArchiveVerifier, MemberInfo, MemberKind, VerificationReport};
pub use walker::FileWalker;

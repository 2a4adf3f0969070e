//! Property-based testing for tarball
//!
//! Uses proptest to check the archive invariants across randomly generated trees:
//! one member per file, none per directory, and byte-identical extraction.

use crate::integration::{extract, tree_digests};
use ::tarball::*;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Generate random file paths
///
/// Directory names never carry an extension and file names always do, so a generated
/// file can never collide with a generated directory.
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    let dir_strategy = prop::collection::vec("d[a-z]{1,6}", 0..=4);
    let filename_strategy = prop_oneof![
        "file[0-9]{1,3}\\.txt",
        "[a-z]{1,8}\\.(txt|rs|md|bin)",
    ];

    (dir_strategy, filename_strategy).prop_map(|(dirs, filename)| {
        let mut path: PathBuf = dirs.into_iter().collect();
        path.push(filename);
        path
    })
}

/// Generate random file content
fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        // Small text files
        "[a-zA-Z0-9 \n]{0,1000}".prop_map(|s| s.into_bytes()),
        // Binary data
        prop::collection::vec(any::<u8>(), 0..10000),
        // Repetitive patterns
        (any::<u8>(), 1..1000usize).prop_map(|(byte, count)| vec![byte; count]),
    ]
}

/// Generate a tree as relative path -> content (later writes win)
fn tree_strategy() -> impl Strategy<Value = BTreeMap<PathBuf, Vec<u8>>> {
    prop::collection::vec((path_strategy(), content_strategy()), 0..40)
        .prop_map(|files| files.into_iter().collect())
}

/// Materialize a generated tree under `root`
fn write_tree(root: &Path, tree: &BTreeMap<PathBuf, Vec<u8>>) -> anyhow::Result<()> {
    for (relative, content) in tree {
        let full_path = root.join(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, content)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Exactly one member per file, named after the file
    #[test]
    fn one_member_per_file(tree in tree_strategy()) {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_tree(root_dir.path(), &tree).unwrap();

        let report = ArchiverBuilder::new()
            .output_path(out_dir.path().join(DEFAULT_OUTPUT_NAME))
            .naming(EntryNaming::RelativeToRoot)
            .build()
            .unwrap()
            .archive(root_dir.path())
            .unwrap();

        let names: Vec<PathBuf> = list_members(&report.output_path)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        let expected: Vec<PathBuf> = tree.keys().cloned().collect();

        prop_assert_eq!(report.files_added, tree.len());
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(sorted, expected);
    }

    /// Extracting the archive reproduces every file byte for byte
    #[test]
    fn extraction_round_trip(tree in tree_strategy()) {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let extract_dir = TempDir::new().unwrap();
        write_tree(root_dir.path(), &tree).unwrap();

        let archiver = ArchiverBuilder::new()
            .output_path(out_dir.path().join("rt.tar.gz"))
            .naming(EntryNaming::RelativeToRoot)
            .build()
            .unwrap();
        let report = archiver.archive(root_dir.path()).unwrap();
        extract(&report.output_path, extract_dir.path()).unwrap();

        prop_assert_eq!(
            tree_digests(root_dir.path()).unwrap(),
            tree_digests(extract_dir.path()).unwrap()
        );
        prop_assert!(archiver.verify(root_dir.path()).unwrap().is_valid());
    }
}

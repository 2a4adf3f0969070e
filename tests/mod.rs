//! Main test module for tarball
//!
//! This module includes all test suites:
//! - Integration tests for the archive properties end to end
//! - Property-based tests over random directory trees
//! - Edge cases

pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::tarball::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory() {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        fs::create_dir_all(root_dir.path().join("a/b/c")).unwrap();
        fs::create_dir_all(root_dir.path().join("d")).unwrap();

        let output = out_dir.path().join(DEFAULT_OUTPUT_NAME);
        let report = Archiver::new(&output).archive(root_dir.path()).unwrap();

        assert_eq!(report.member_count(), 0);
        assert!(output.exists());
        assert!(list_members(&output).unwrap().is_empty());
    }

    #[test]
    fn test_special_filenames() {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "ünïcödé.txt",
        ];

        let mut created = Vec::new();
        for name in &special_names {
            let path = root_dir.path().join(name);
            if fs::write(&path, format!("Content of {}", name)).is_err() {
                // Skip if OS doesn't support this filename
                continue;
            }
            created.push(PathBuf::from(name));
        }
        created.sort();

        let output = out_dir.path().join("special.tar.gz");
        ArchiverBuilder::new()
            .output_path(&output)
            .naming(EntryNaming::RelativeToRoot)
            .build()
            .unwrap()
            .archive(root_dir.path())
            .unwrap();

        let mut names: Vec<_> = list_members(&output).unwrap().into_iter().map(|m| m.name).collect();
        names.sort();
        assert_eq!(names, created);
    }

    #[test]
    fn test_long_member_names() {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();

        // Past the 100 byte ustar name field
        let deep: PathBuf = (0..12).map(|i| format!("directory_{:02}", i)).collect();
        fs::create_dir_all(root_dir.path().join(&deep)).unwrap();
        let file = deep.join("a_file_with_a_fairly_long_name_as_well.txt");
        fs::write(root_dir.path().join(&file), "deep").unwrap();

        let output = out_dir.path().join("long.tar.gz");
        ArchiverBuilder::new()
            .output_path(&output)
            .naming(EntryNaming::RelativeToRoot)
            .build()
            .unwrap()
            .archive(root_dir.path())
            .unwrap();

        let members = list_members(&output).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, file);
    }

    #[test]
    fn test_large_file() {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        fs::write(root_dir.path().join("big.bin"), &content).unwrap();

        let archiver = Archiver::new(out_dir.path().join("big.tar.gz"));
        let report = archiver.archive(root_dir.path()).unwrap();

        assert_eq!(report.bytes_read, content.len() as u64);
        assert!(report.archive_size < report.bytes_read);
        assert!(archiver.verify(root_dir.path()).unwrap().is_valid());
    }

    #[test]
    fn test_overwrites_previous_archive() {
        let root_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join(DEFAULT_OUTPUT_NAME);
        fs::write(&output, "stale contents that are not an archive").unwrap();
        fs::write(root_dir.path().join("a.txt"), "a").unwrap();

        for atomic in [true, false] {
            ArchiverBuilder::new()
                .output_path(&output)
                .atomic(atomic)
                .build()
                .unwrap()
                .archive(root_dir.path())
                .unwrap();
            assert_eq!(list_members(&output).unwrap().len(), 1);
        }
    }
}

//! Basic file and directory operations.

use crate::support::mounted_fs;
use simfs::{CachingScheme, FsError, SimWorld};

#[test]
fn create_file_and_query_it() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 100_000);

    fs.create_file("/data/foo.txt", 10_000).unwrap();
    assert!(fs.file_exists("/data/foo.txt").unwrap());
    assert_eq!(fs.file_size("/data/foo.txt").unwrap(), 10_000);
    assert!(!fs.file_exists("/data/bar.txt").unwrap());

    let partition = fs.partition_by_name("/data").unwrap();
    assert_eq!(partition.get_num_files(), 1);
    assert_eq!(partition.get_free_space(), 90_000);
}

#[test]
fn duplicate_creation_is_rejected() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 100_000);

    fs.create_file("/data/foo.txt", 10).unwrap();
    assert_eq!(
        fs.create_file("/data/foo.txt", 10),
        Err(FsError::FileAlreadyExists("/foo.txt".to_string()))
    );
    // The failed creation consumed nothing.
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 99_990);
}

#[test]
fn free_space_is_conserved_across_create_and_unlink() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);
    let partition = fs.partition_by_name("/data").unwrap();

    let sizes = [100u64, 250, 50, 400];
    for (i, size) in sizes.iter().enumerate() {
        fs.create_file(&format!("/data/f{i}"), *size).unwrap();
    }
    let resident: u64 = sizes.iter().sum();
    assert_eq!(partition.get_free_space(), 1_000 - resident);

    fs.unlink_file("/data/f1").unwrap();
    fs.unlink_file("/data/f3").unwrap();
    assert_eq!(partition.get_free_space(), 1_000 - 100 - 50);

    fs.unlink_file("/data/f0").unwrap();
    fs.unlink_file("/data/f2").unwrap();
    assert_eq!(partition.get_free_space(), 1_000);
    assert_eq!(partition.get_num_files(), 0);
}

#[test]
fn unlink_missing_file_fails() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);
    assert_eq!(
        fs.unlink_file("/data/ghost"),
        Err(FsError::NoSuchFile("/ghost".to_string()))
    );
}

#[test]
fn directories_spring_into_existence_with_files() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 100_000);

    fs.create_file("/data/logs/a.log", 10).unwrap();
    fs.create_file("/data/logs/b.log", 10).unwrap();
    assert!(fs.directory_exists("/data/logs").unwrap());

    let names: Vec<String> = fs
        .list_files_in_directory("/data/logs")
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(names, vec!["a.log".to_string(), "b.log".to_string()]);
}

#[test]
fn explicit_directory_lifecycle() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 100_000);

    fs.create_directory("/data/empty").unwrap();
    assert!(fs.directory_exists("/data/empty").unwrap());
    assert_eq!(
        fs.create_directory("/data/empty"),
        Err(FsError::DirectoryAlreadyExists("/empty".to_string()))
    );

    fs.create_file("/data/empty/x", 5).unwrap();
    assert_eq!(
        fs.unlink_directory("/data/empty"),
        Err(FsError::DirectoryNotEmpty("/empty".to_string()))
    );

    fs.unlink_file("/data/empty/x").unwrap();
    fs.unlink_directory("/data/empty").unwrap();
    assert!(!fs.directory_exists("/data/empty").unwrap());

    assert_eq!(
        fs.list_files_in_directory("/data/empty"),
        Err(FsError::NoSuchDirectory("/empty".to_string()))
    );
}

#[test]
fn move_renames_within_partition() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    fs.create_file("/data/src.txt", 100).unwrap();
    fs.move_file("/data/src.txt", "/data/sub/dst.txt", false).unwrap();

    assert!(!fs.file_exists("/data/src.txt").unwrap());
    assert!(fs.file_exists("/data/sub/dst.txt").unwrap());
    assert_eq!(fs.file_size("/data/sub/dst.txt").unwrap(), 100);
    // A move shuffles metadata, never bytes.
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 900);
}

#[test]
fn move_overwrite_needs_the_flag() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    fs.create_file("/data/a", 100).unwrap();
    fs.create_file("/data/b", 300).unwrap();

    assert_eq!(
        fs.move_file("/data/a", "/data/b", false),
        Err(FsError::DestinationExists("/b".to_string()))
    );

    fs.move_file("/data/a", "/data/b", true).unwrap();
    assert!(!fs.file_exists("/data/a").unwrap());
    assert_eq!(fs.file_size("/data/b").unwrap(), 100);
    // The overwritten destination's bytes are reclaimed.
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 900);
}

#[test]
fn move_onto_itself_is_a_noop() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    fs.create_file("/data/a", 100).unwrap();
    fs.move_file("/data/a", "/data/a", false).unwrap();
    assert!(fs.file_exists("/data/a").unwrap());
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 900);
}

#[test]
fn truncate_adjusts_size_and_space() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    fs.create_file("/data/a", 600).unwrap();
    fs.truncate_file("/data/a", 200).unwrap();
    assert_eq!(fs.file_size("/data/a").unwrap(), 200);
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 800);

    fs.truncate_file("/data/a", 700).unwrap();
    assert_eq!(fs.file_size("/data/a").unwrap(), 700);
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 300);

    // Growth past capacity fails atomically under CachingScheme::None.
    let err = fs.truncate_file("/data/a", 1_100).unwrap_err();
    assert!(matches!(err, FsError::InsufficientSpace { .. }));
    assert_eq!(fs.file_size("/data/a").unwrap(), 700);
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 300);
}

//! Mount table and path resolution tests.

use crate::support::linear_disk;
use simfs::{CachingScheme, FileSystem, FsError, OneDiskStorage, SimWorld};

fn fs_with_storage(sim: &SimWorld) -> (FileSystem, std::rc::Rc<OneDiskStorage>) {
    let storage = OneDiskStorage::create(sim, "local", linear_disk("disk0", 1_000_000));
    let fs = FileSystem::create(sim, "fs", FileSystem::DEFAULT_MAX_OPEN_FILES);
    (fs, storage)
}

#[test]
fn conflicting_mounts_are_rejected() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    fs.mount_partition("/data", storage.clone(), 1_000, CachingScheme::None)
        .unwrap();

    // Equal, nested under, and covering mounts all conflict.
    for conflicting in ["/data", "/data/sub", "/"] {
        let err = fs
            .mount_partition(conflicting, storage.clone(), 1_000, CachingScheme::None)
            .unwrap_err();
        assert!(matches!(err, FsError::MountConflict(_, _)), "{conflicting}");
    }

    // A sibling is fine.
    fs.mount_partition("/scratch", storage, 1_000, CachingScheme::None)
        .unwrap();
}

#[test]
fn mount_points_are_normalized() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    let partition = fs
        .mount_partition("/dev/a/", storage, 1_000, CachingScheme::None)
        .unwrap();
    assert_eq!(partition.get_name(), "/dev/a");

    fs.create_file("/dev/a/x", 10).unwrap();
    assert!(fs.file_exists("/dev/./a//x").unwrap());
}

#[test]
fn resolution_matches_component_boundaries_only() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    fs.mount_partition("/a", storage.clone(), 1_000, CachingScheme::None)
        .unwrap();
    fs.mount_partition("/ab", storage, 2_000, CachingScheme::None)
        .unwrap();

    // "/ab/file" lands on "/ab", never on "/a".
    fs.create_file("/ab/file", 100).unwrap();
    let partition = fs.get_partition_for_path_or_null("/ab/file").unwrap();
    assert_eq!(partition.get_name(), "/ab");
    assert_eq!(fs.get_free_space_at_path("/ab/file").unwrap(), 1_900);
    assert_eq!(fs.get_free_space_at_path("/a/file").unwrap(), 1_000);
}

#[test]
fn longest_prefix_wins() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    fs.mount_partition("/data", storage.clone(), 1_000, CachingScheme::None)
        .unwrap();
    fs.mount_partition("/data2/nested", storage, 2_000, CachingScheme::None)
        .unwrap();

    assert_eq!(
        fs.get_partition_for_path_or_null("/data2/nested/x")
            .unwrap()
            .get_name(),
        "/data2/nested"
    );
    assert_eq!(
        fs.get_partition_for_path_or_null("/data/x").unwrap().get_name(),
        "/data"
    );
}

#[test]
fn unmounted_paths_have_no_partition() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);
    fs.mount_partition("/data", storage, 1_000, CachingScheme::None)
        .unwrap();

    assert_eq!(
        fs.create_file("/elsewhere/x", 1),
        Err(FsError::NoSuchPartition("/elsewhere/x".to_string()))
    );
    assert!(fs.get_partition_for_path_or_null("/elsewhere/x").is_none());
}

#[test]
fn partition_lookups() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    fs.mount_partition("/data", storage.clone(), 1_000, CachingScheme::Fifo)
        .unwrap();
    fs.mount_partition("/scratch", storage, 500, CachingScheme::None)
        .unwrap();

    let data = fs.partition_by_name("/data").unwrap();
    assert_eq!(data.get_size(), 1_000);
    assert_eq!(data.caching_scheme(), CachingScheme::Fifo);

    assert!(fs.partition_by_name_or_null("/nope").is_none());
    assert_eq!(
        fs.partition_by_name("/nope").unwrap_err(),
        FsError::NoSuchPartition("/nope".to_string())
    );

    let names: Vec<String> = fs.get_partitions().iter().map(|p| p.get_name()).collect();
    assert_eq!(names, vec!["/data".to_string(), "/scratch".to_string()]);
}

#[test]
fn one_storage_can_back_multiple_partitions() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);

    fs.mount_partition("/a", storage.clone(), 600, CachingScheme::None)
        .unwrap();
    fs.mount_partition("/b", storage, 400, CachingScheme::None)
        .unwrap();

    fs.create_file("/a/x", 600).unwrap();
    // Space accounting is per-partition.
    assert_eq!(fs.get_free_space_at_path("/b").unwrap(), 400);
}

#[test]
fn cross_partition_moves_are_rejected() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);
    fs.mount_partition("/a", storage.clone(), 1_000, CachingScheme::None)
        .unwrap();
    fs.mount_partition("/b", storage, 1_000, CachingScheme::None)
        .unwrap();

    fs.create_file("/a/x", 10).unwrap();
    assert_eq!(
        fs.move_file("/a/x", "/b/x", false),
        Err(FsError::InvalidMove("/a/x".to_string(), "/b/x".to_string()))
    );
    assert!(fs.file_exists("/a/x").unwrap());
}

#[test]
fn relative_paths_are_rejected() {
    let sim = SimWorld::new();
    let (fs, storage) = fs_with_storage(&sim);
    fs.mount_partition("/data", storage, 1_000, CachingScheme::None)
        .unwrap();

    assert_eq!(
        fs.create_file("data/x", 1),
        Err(FsError::InvalidPath("data/x".to_string()))
    );
}

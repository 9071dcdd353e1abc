//! CachingScheme::None - no eviction ever.

use crate::support::mounted_fs;
use simfs::{CachingScheme, FsError, SimWorld};

#[test]
fn over_capacity_creation_fails_atomically() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);
    fs.create_file("/data/existing", 400).unwrap();

    let err = fs.create_file("/data/too_big", 700).unwrap_err();
    assert_eq!(
        err,
        FsError::InsufficientSpace {
            partition: "/data".to_string(),
            needed: 700,
            available: 600,
        }
    );

    // Nothing changed: no partial commit, no eviction.
    assert!(!fs.file_exists("/data/too_big").unwrap());
    assert!(fs.file_exists("/data/existing").unwrap());
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 600);
}

#[test]
fn a_full_partition_rejects_even_one_byte() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    fs.create_file("/data/x", 1_000).unwrap();
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 0);

    let err = fs.create_file("/data/y", 1).unwrap_err();
    assert!(matches!(err, FsError::InsufficientSpace { .. }));
    assert!(fs.file_exists("/data/x").unwrap());
}

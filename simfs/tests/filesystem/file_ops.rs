//! File handle I/O: reads, writes, seeks, truncation.
//!
//! Transfers run against a 1 MB/s disk with no access latency, so a
//! transfer of n bytes advances the clock by exactly n microseconds.

use crate::support::{drive, mounted_fs};
use simfs::{CachingScheme, FsError, SeekOrigin, SimWorld};
use std::time::Duration;

#[test]
fn read_suspends_until_the_simulated_transfer_completes() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 500_000).unwrap();

    let bytes = drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "r").unwrap();
            file.read(200_000).await.unwrap()
        }
    });

    assert_eq!(bytes, 200_000);
    assert_eq!(sim.now(), Duration::from_micros(200_000));
}

#[test]
fn reads_shorten_at_end_of_file() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 10_000).unwrap();

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "r").unwrap();

            // Reading 0 bytes returns 0.
            assert_eq!(file.read(0).await.unwrap(), 0);
            // Asking for more than the file holds returns the remainder.
            assert_eq!(file.read(100_000).await.unwrap(), 10_000);
            // At end-of-file reads return 0 without error.
            assert_eq!(file.read(10_000).await.unwrap(), 0);

            // Seek back and read part of the file again.
            file.seek(0, SeekOrigin::Set).unwrap();
            assert_eq!(file.read(9_000).await.unwrap(), 9_000);
            assert_eq!(file.tell(), 9_000);
        }
    });
}

#[test]
fn seeking_past_eof_reads_zero_bytes() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 100).unwrap();

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "r").unwrap();
            let pos = file.seek(50, SeekOrigin::End).unwrap();
            assert_eq!(pos, 150);
            assert_eq!(file.read(10).await.unwrap(), 0);
        }
    });
}

#[test]
fn negative_seeks_are_invalid() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 100).unwrap();

    let mut file = fs.open("/data/x", "r").unwrap();
    assert_eq!(file.seek(-1, SeekOrigin::Set), Err(FsError::InvalidSeek(-1)));
    assert_eq!(
        file.seek(-101, SeekOrigin::End),
        Err(FsError::InvalidSeek(-101))
    );
    // A failed seek leaves the offset alone.
    assert_eq!(file.tell(), 0);

    // Relative seeks from a valid position.
    file.seek(60, SeekOrigin::Set).unwrap();
    assert_eq!(file.seek(-10, SeekOrigin::Current).unwrap(), 50);
}

#[test]
fn writes_grow_the_file_and_consume_space() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "w").unwrap();
            assert_eq!(file.write(30_000).await.unwrap(), 30_000);
            assert_eq!(file.size().unwrap(), 30_000);
            assert_eq!(file.tell(), 30_000);

            // Overwriting in place consumes no extra space.
            file.seek(0, SeekOrigin::Set).unwrap();
            assert_eq!(file.write(10_000).await.unwrap(), 10_000);
            assert_eq!(file.size().unwrap(), 30_000);
            file.close().unwrap();
        }
    });

    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 970_000);
    assert_eq!(sim.now(), Duration::from_micros(40_000));
}

#[test]
fn append_writes_at_end_of_file() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 1_000).unwrap();

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "w").unwrap();
            file.append(500).await.unwrap();
            assert_eq!(file.size().unwrap(), 1_500);
            assert_eq!(file.tell(), 1_500);

            // Mode "a" repositions to the end on every write.
            let mut appender = fs.open("/data/x", "a").unwrap();
            appender.seek(0, SeekOrigin::Set).unwrap();
            appender.write(100).await.unwrap();
            assert_eq!(appender.size().unwrap(), 1_600);
        }
    });
}

#[test]
fn access_mode_gates_reads_and_writes() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 100).unwrap();

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut reader = fs.open("/data/x", "r").unwrap();
            assert_eq!(
                reader.write(10).await.unwrap_err(),
                FsError::InvalidAccessMode("r".to_string())
            );
            assert!(reader.truncate(10).is_err());

            let mut writer = fs.open("/data/x", "w").unwrap();
            assert_eq!(
                writer.read(10).await.unwrap_err(),
                FsError::InvalidAccessMode("w".to_string())
            );
        }
    });
}

#[test]
fn write_without_space_fails_before_simulating_anything() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "w").unwrap();
            let err = file.write(2_000).await.unwrap_err();
            assert!(matches!(err, FsError::InsufficientSpace { .. }));
        }
    });

    // The failed write consumed no simulated time and no space.
    assert_eq!(sim.now(), Duration::ZERO);
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 1_000);
}

#[test]
fn dates_track_simulated_completion_times() {
    let mut sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000_000);
    fs.create_file("/data/x", 100_000).unwrap();

    drive(&mut sim, {
        let fs = fs.clone();
        async move {
            let mut file = fs.open("/data/x", "r").unwrap();
            file.read(100_000).await.unwrap();
            let stat = file.stat().unwrap();
            assert_eq!(stat.last_access_date, Duration::from_micros(100_000));
            // Reading does not modify.
            assert_eq!(stat.last_modification_date, Duration::ZERO);
            drop(file);

            let mut writer = fs.open("/data/x", "w").unwrap();
            writer.write(50_000).await.unwrap();
            let stat = writer.stat().unwrap();
            assert_eq!(stat.last_modification_date, Duration::from_micros(150_000));
        }
    });
}

#[test]
fn truncate_through_a_writable_handle() {
    let sim = SimWorld::new();
    let fs = mounted_fs(&sim, CachingScheme::None, 1_000);
    fs.create_file("/data/x", 600).unwrap();

    let mut file = fs.open("/data/x", "w").unwrap();
    file.truncate(100).unwrap();
    assert_eq!(file.size().unwrap(), 100);
    assert_eq!(fs.get_free_space_at_path("/data").unwrap(), 900);
}

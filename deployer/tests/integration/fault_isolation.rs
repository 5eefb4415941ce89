// minetile_deployer/deployer/tests/integration/fault_isolation.rs
mod common;

use minetile_deployer::core::constants::{CONTAINERS_DIR_NAME, SECTOR_BYTES};
use minetile_deployer::core::types::{RegionCoord, TileCoord};
use minetile_deployer::deploy;
use minetile_deployer::region::RegionFile;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Overwrites the compression marker of the chunk in slot (cx, cz) with an unknown scheme.
fn corrupt_compression_marker(region_path: &Path, cx: usize, cz: usize) {
    let mut file = OpenOptions::new().read(true).write(true).open(region_path).unwrap();
    let mut entry = [0u8; 4];
    file.seek(SeekFrom::Start(((cx + cz * 32) * 4) as u64)).unwrap();
    file.read_exact(&mut entry).unwrap();
    let sector = u32::from_be_bytes(entry) >> 8;
    assert!(sector >= 2, "slot ({}, {}) is empty", cx, cz);

    file.seek(SeekFrom::Start(sector as u64 * SECTOR_BYTES as u64 + 4)).unwrap();
    file.write_all(&[9]).unwrap();
}

#[test]
fn one_bad_chunk_only_affects_its_tile() {
    let dir = tempfile::tempdir().unwrap();
    let clean_world = common::build_world(&dir.path().join("clean"));
    let broken_world = common::build_world(&dir.path().join("broken"));
    corrupt_compression_marker(&broken_world.join("region").join(RegionCoord::new(3, -4).file_name()), 2, 3);

    let clean_out = dir.path().join("clean_out");
    let broken_out = dir.path().join("broken_out");
    deploy(&common::config(&clean_world, &clean_out, 4)).unwrap();
    let summary = deploy(&common::config(&broken_world, &broken_out, 4)).unwrap();

    assert!(summary.failures.is_empty());
    assert_eq!(summary.produced, 7);

    let hit = summary.report_for(TileCoord::new(1, -1)).unwrap();
    assert_eq!(hit.failed_chunks, 1);
    assert_eq!(hit.failed_regions, 0);
    assert_eq!(hit.errors.len(), 1);
    assert!(hit.errors[0].contains("r.3.-4.mca"));
    assert!(summary.reports.iter().filter(|r| r.ordinal != hit.ordinal).all(|r| r.failed_chunks == 0));

    let clean = common::snapshot(&clean_out.join(CONTAINERS_DIR_NAME));
    let broken = common::snapshot(&broken_out.join(CONTAINERS_DIR_NAME));
    let hit_prefix = Path::new(&hit.name);
    for (path, bytes) in &clean {
        if path.starts_with(hit_prefix) {
            continue;
        }
        assert!(broken.get(path) == Some(bytes), "{} differs", path.display());
    }

    // the rest of the damaged region still made it across, at local region (1, -2)
    let copied = broken_out
        .join(CONTAINERS_DIR_NAME)
        .join(&hit.name)
        .join("world/region")
        .join(RegionCoord::new(1, -2).file_name());
    let mut region = RegionFile::open_for_read(copied).unwrap();
    assert_eq!(region.chunk_count(), common::CHUNK_SLOTS.len() - 1);
    assert!(!region.has_chunk(2, 3));
    assert!(region.read_chunk(31, 31).unwrap().is_some());
}

#[test]
fn unusable_tile_output_is_reported_while_others_finish() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    let output = dir.path().join("deploy");
    let containers = output.join(CONTAINERS_DIR_NAME);
    std::fs::create_dir_all(&containers).unwrap();
    std::fs::write(containers.join("MineTile.0.0"), b"in the way").unwrap();

    let summary = deploy(&common::config(&world, &output, 3)).unwrap();
    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!((failure.x, failure.z), (0, 0));
    assert_eq!(failure.ordinal, 4);
    assert!(failure.message.contains("(0, 0)"));

    assert_eq!(summary.reports.len(), 8);
    assert_eq!(summary.produced, 6);
    assert_eq!(summary.pruned, 2);
    assert!(containers.join("MineTile.1.1").join("world/level.dat").is_file());
}

#[test]
fn truncated_region_fails_only_that_region() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    std::fs::write(world.join("region").join(RegionCoord::new(3, -4).file_name()), vec![0u8; 100]).unwrap();

    let summary = deploy(&common::config(&world, &dir.path().join("deploy"), 2)).unwrap();
    let hit = summary.report_for(TileCoord::new(1, -1)).unwrap();
    assert_eq!(hit.failed_regions, 1);
    // (2,-2) is still copied
    assert_eq!(hit.regions, 2);
    assert_eq!(hit.chunks, common::CHUNK_SLOTS.len());
    assert!(summary.failures.is_empty());
}

// minetile_deployer/deployer/tests/integration/tiling.rs
mod common;

use minetile_deployer::core::constants::CONTAINERS_DIR_NAME;
use minetile_deployer::core::types::{RegionCoord, TileCoord};
use minetile_deployer::deploy;
use minetile_deployer::nbt::{self, Tag};
use minetile_deployer::region::RegionFile;

#[test]
fn radius_one_deploys_nine_tiles_and_prunes_empty_ones() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    let output = dir.path().join("deploy");

    let summary = deploy(&common::config(&world, &output, 4)).unwrap();
    assert_eq!(summary.total, 9);
    assert!(summary.failures.is_empty());
    assert_eq!(summary.pruned, 2);
    assert_eq!(summary.produced, 7);

    for empty in [TileCoord::new(-1, -1), TileCoord::new(0, -1)] {
        let report = summary.report_for(empty).unwrap();
        assert_eq!(report.regions, 0);
        assert!(report.empty && report.pruned);
        assert!(!output.join(CONTAINERS_DIR_NAME).join(&report.name).exists());
    }

    let center = summary.report_for(TileCoord::new(0, 0)).unwrap();
    // (0,0), (1,1) and (-1,0) fall into the center window
    assert_eq!(center.regions, 3);
    assert_eq!(center.chunks, 3 * common::CHUNK_SLOTS.len());
    assert_eq!(center.name, "MineTile.0.0");
    assert_eq!(center.host, "127.0.0.1");

    let lines = std::fs::read_to_string(output.join("tiles.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 7);
}

#[test]
fn tile_contents_are_rebased_to_the_tile_origin() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    let output = dir.path().join("deploy");
    deploy(&common::config(&world, &output, 2)).unwrap();

    // source region (1,1) is local region (-1,-1) of tile (1,1), whose offset is region (2,2)
    let tile_world = output.join(CONTAINERS_DIR_NAME).join("MineTile.1.1").join("world");
    let mut region = RegionFile::open_for_read(tile_world.join("region").join(RegionCoord::new(-1, -1).file_name())).unwrap();
    assert_eq!(region.chunk_count(), common::CHUNK_SLOTS.len());
    assert_eq!(region.timestamp(2, 3).unwrap(), 1_500_000_001);

    let doc = region.read_chunk(2, 3).unwrap().unwrap();
    let level = doc.root.get_compound("Level").unwrap();
    assert_eq!(level.get_int("xPos"), Some(2 - 32));
    assert_eq!(level.get_int("zPos"), Some(3 - 32));

    let cow = level.get_list("Entities").and_then(|l| l.get(0)).and_then(Tag::as_compound).unwrap();
    let pos = cow.get_list("Pos").unwrap();
    // absolute x = (32 + 2) * 16 + 8.5, minus 2 * 512
    assert_eq!(pos.get(0).and_then(Tag::as_double), Some(552.5 - 1024.0));
    assert_eq!(pos.get(1).and_then(Tag::as_double), Some(64.0));
    assert_eq!(pos.get(2).and_then(Tag::as_double), Some(563.25 - 1024.0));

    let chest = level.get_list("TileEntities").and_then(|l| l.get(0)).and_then(Tag::as_compound).unwrap();
    assert_eq!(chest.get_int("x"), Some(545 - 1024));
    assert_eq!(chest.get_int("z"), Some(562 - 1024));

    let meta = nbt::read_gzip_file(&tile_world.join("level.dat")).unwrap();
    let data = meta.root.get_compound("Data").unwrap();
    assert_eq!(data.get_str("LevelName"), Some("MineTile_x1_z1"));
    let rules = data.get_compound("GameRules").unwrap();
    assert_eq!(rules.get_str("doMobSpawning"), Some("false"));
    assert_eq!(rules.get_str("keepInventory"), Some("true"));
}

#[test]
fn pool_size_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());

    let single = dir.path().join("single");
    let wide = dir.path().join("wide");
    deploy(&common::config(&world, &single, 1)).unwrap();
    deploy(&common::config(&world, &wide, 8)).unwrap();

    let a = common::snapshot(&single.join(CONTAINERS_DIR_NAME));
    let b = common::snapshot(&wide.join(CONTAINERS_DIR_NAME));
    assert!(!a.is_empty());
    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    assert!(a == b, "container trees differ between pool sizes");
}

#[test]
fn rerun_replaces_region_files() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    let output = dir.path().join("deploy");

    deploy(&common::config(&world, &output, 2)).unwrap();
    let first = common::snapshot(&output.join(CONTAINERS_DIR_NAME));
    deploy(&common::config(&world, &output, 2)).unwrap();
    let second = common::snapshot(&output.join(CONTAINERS_DIR_NAME));
    assert!(first == second, "second run did not reproduce the first");
}

#[test]
fn colliding_tile_names_leave_the_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let world = common::build_world(dir.path());
    let output = dir.path().join("deploy");
    let mut config = common::config(&world, &output, 1);
    config.names = vec!["shared".to_string()];

    let err = deploy(&config).unwrap_err();
    assert!(err.is_fatal(), "{}", err);
    assert!(!output.join(CONTAINERS_DIR_NAME).exists());
}

// minetile_deployer/deployer/tests/integration/common/mod.rs
#![allow(dead_code)]

use minetile_deployer::core::config::DeployConfig;
use minetile_deployer::core::types::RegionCoord;
use minetile_deployer::nbt::{self, Compound, Document, List, Tag};
use minetile_deployer::region::RegionFile;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Regions present in the synthetic world. With radius 1 and tile size 16, tiles
/// (-1,-1) and (0,-1) see none of them and (3,-4) is only read by tile (1,-1).
pub const WORLD_REGIONS: &[(i32, i32)] = &[(0, 0), (1, 1), (2, -2), (3, -4), (-1, 0)];

/// Slots filled in every region.
pub const CHUNK_SLOTS: &[(i32, i32)] = &[(0, 0), (2, 3), (31, 31), (17, 5)];

pub fn chunk(region: RegionCoord, cx: i32, cz: i32) -> Document {
    let (first_x, first_z) = region.first_chunk();
    let (chunk_x, chunk_z) = (first_x + cx, first_z + cz);

    let mut pos = List::new();
    pos.push(chunk_x as f64 * 16.0 + 8.5).unwrap();
    pos.push(64.0f64).unwrap();
    pos.push(chunk_z as f64 * 16.0 + 3.25).unwrap();
    let mut cow = Compound::new();
    cow.insert("id", "minecraft:cow");
    cow.insert("Pos", pos);

    let mut chest = Compound::new();
    chest.insert("id", "minecraft:chest");
    chest.insert("x", chunk_x * 16 + 1);
    chest.insert("y", 70);
    chest.insert("z", chunk_z * 16 + 2);

    let mut level = Compound::new();
    level.insert("xPos", chunk_x);
    level.insert("zPos", chunk_z);
    level.insert("LastUpdate", 1000i64 + cx as i64);
    level.insert("Biomes", Tag::ByteArray(vec![1; 256]));
    level.insert("Entities", List::from_tags(vec![Tag::Compound(cow)]).unwrap());
    level.insert("TileEntities", List::from_tags(vec![Tag::Compound(chest)]).unwrap());
    level.insert("TileTicks", List::new());

    let mut root = Compound::new();
    root.insert("DataVersion", 1343);
    root.insert("Level", level);
    Document::new("", root)
}

pub fn write_region(region_dir: &Path, region: RegionCoord) {
    let mut file = RegionFile::open_or_create_for_write(region_dir.join(region.file_name())).unwrap();
    for (i, &(cx, cz)) in CHUNK_SLOTS.iter().enumerate() {
        file.write_chunk(cx, cz, &chunk(region, cx, cz)).unwrap();
        file.set_timestamp(cx, cz, 1_500_000_000 + i as u32).unwrap();
    }
    file.close().unwrap();
}

/// Writes a world with `WORLD_REGIONS` and a `level.dat` under `root/world`.
pub fn build_world(root: &Path) -> PathBuf {
    let world = root.join("world");
    let regions = world.join("region");
    fs::create_dir_all(&regions).unwrap();
    for &(x, z) in WORLD_REGIONS {
        write_region(&regions, RegionCoord::new(x, z));
    }

    let mut rules = Compound::new();
    rules.insert("keepInventory", "true");
    let mut data = Compound::new();
    data.insert("LevelName", "Source World");
    data.insert("SpawnX", 0);
    data.insert("GameRules", rules);
    let mut root_tag = Compound::new();
    root_tag.insert("Data", data);
    nbt::write_gzip_file(&world.join("level.dat"), &Document::new("", root_tag)).unwrap();
    world
}

pub fn config(world: &Path, output: &Path, threads: usize) -> DeployConfig {
    DeployConfig {
        input: world.to_path_buf(),
        output: output.to_path_buf(),
        radius: 1,
        tile_size: 16,
        threads,
        overwrite_game_rules: true,
        ..Default::default()
    }
}

/// Relative path to file bytes for everything under `dir`.
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                out.insert(path.strip_prefix(base).unwrap().to_path_buf(), fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

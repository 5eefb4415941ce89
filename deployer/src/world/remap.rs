// minetile_deployer/deployer/src/world/remap.rs
use crate::core::constants::CHUNKS_PER_REGION_AXIS;
use crate::core::types::{BlockOffset, RegionCoord};
use crate::nbt::{Compound, List, Tag};

/// Lists whose entries are full entities with a 3-component `Pos`.
const ENTITY_LISTS: &[&str] = &["Entities"];
/// Lists whose entries carry integer block `x`/`y`/`z` fields.
const BLOCK_POSITION_LISTS: &[&str] = &[
    "TileEntities",
    "TileTicks",
    "LiquidTicks",
    "block_entities",
    "block_ticks",
    "fluid_ticks",
];

/// Where a chunk lands: the destination region its slot belongs to, and the
/// block translation subtracted from every absolute position inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapTarget {
    pub region: RegionCoord,
    pub block_offset: BlockOffset,
}

impl RemapTarget {
    /// Chunk positions are rebased into `region`, entity positions shifted by `region * 512`.
    pub fn for_region(region: RegionCoord) -> Self {
        RemapTarget { region, block_offset: region.block_origin() }
    }

    /// Chunk positions are rebased into the tile-local `region`; absolute positions
    /// are shifted by the tile's world offset.
    pub fn new(region: RegionCoord, world_offset: RegionCoord) -> Self {
        RemapTarget { region, block_offset: world_offset.block_origin() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapStats {
    /// The chunk had a body with position fields, which were rewritten.
    pub positioned: bool,
    pub entities: usize,
    pub block_entries: usize,
    /// Entries left as they were because a position field was missing or not numeric.
    pub skipped: usize,
}

/// Rewrites a chunk document from world-absolute to tile-local coordinates, in place.
///
/// Handles both the legacy layout (everything under `Level`) and the flattened
/// layout (fields at the root). Horizontal axes only; heights never change.
pub fn remap_chunk(root: &mut Compound, cx: i32, cz: i32, target: &RemapTarget) -> RemapStats {
    let mut stats = RemapStats::default();
    let Some(body) = chunk_body(root) else {
        return stats;
    };

    body.insert("xPos", cx + target.region.x * CHUNKS_PER_REGION_AXIS);
    body.insert("zPos", cz + target.region.z * CHUNKS_PER_REGION_AXIS);
    stats.positioned = true;

    let offset = target.block_offset;
    for name in ENTITY_LISTS {
        if let Some(list) = body.get_list_mut(name) {
            for entity in list.compounds_mut() {
                shift_entity(entity, offset, &mut stats);
            }
        }
    }
    for name in BLOCK_POSITION_LISTS {
        if let Some(list) = body.get_list_mut(name) {
            for entry in list.compounds_mut() {
                if shift_xz_fields(entry, "x", "z", offset) {
                    stats.block_entries += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }
    }
    stats
}

fn chunk_body(root: &mut Compound) -> Option<&mut Compound> {
    if root.get_compound("Level").is_some() {
        return root.get_compound_mut("Level");
    }
    if root.contains_key("xPos") || root.contains_key("zPos") {
        return Some(root);
    }
    None
}

fn shift_entity(entity: &mut Compound, offset: BlockOffset, stats: &mut RemapStats) {
    let shifted = entity.get_list_mut("Pos").map(|pos| shift_pos(pos, offset)).unwrap_or(false);
    if shifted {
        stats.entities += 1;
    } else {
        stats.skipped += 1;
    }

    // Hanging entities also record the block they hang on.
    if entity.contains_key("TileX") || entity.contains_key("TileZ") {
        if !shift_xz_fields(entity, "TileX", "TileZ", offset) {
            stats.skipped += 1;
        }
    }

    if let Some(passengers) = entity.get_list_mut("Passengers") {
        for rider in passengers.compounds_mut() {
            shift_entity(rider, offset, stats);
        }
    }
}

/// Shifts elements 0 and 2 of a `Pos` list, keeping its element kind.
fn shift_pos(pos: &mut List, offset: BlockOffset) -> bool {
    if pos.len() < 3 {
        return false;
    }
    let (Some(x), Some(z)) = (pos.get(0).and_then(|t| shifted(t, offset.x)), pos.get(2).and_then(|t| shifted(t, offset.z))) else {
        return false;
    };
    pos.set(0, x).is_ok() && pos.set(2, z).is_ok()
}

/// Shifts two named fields together; if either is missing or not numeric, neither changes.
fn shift_xz_fields(entry: &mut Compound, x_key: &str, z_key: &str, offset: BlockOffset) -> bool {
    let (Some(x), Some(z)) = (
        entry.get(x_key).and_then(|t| shifted(t, offset.x)),
        entry.get(z_key).and_then(|t| shifted(t, offset.z)),
    ) else {
        return false;
    };
    entry.insert(x_key, x);
    entry.insert(z_key, z);
    true
}

/// `tag - delta` in the tag's own numeric type; `None` for non-numeric tags or on overflow.
fn shifted(tag: &Tag, delta: i32) -> Option<Tag> {
    Some(match tag {
        Tag::Byte(v) => Tag::Byte(i8::try_from(*v as i32 - delta).ok()?),
        Tag::Short(v) => Tag::Short(i16::try_from(*v as i32 - delta).ok()?),
        Tag::Int(v) => Tag::Int(v.checked_sub(delta)?),
        Tag::Long(v) => Tag::Long(v.checked_sub(delta as i64)?),
        Tag::Float(v) => Tag::Float(*v - delta as f32),
        Tag::Double(v) => Tag::Double(*v - delta as f64),
        _ => return None,
    })
}

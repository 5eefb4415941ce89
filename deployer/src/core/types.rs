// minetile_deployer/deployer/src/core/types.rs
use serde::Serialize;
use std::fmt;

use crate::core::constants::{BLOCKS_PER_REGION_AXIS, CHUNKS_PER_REGION_AXIS};
use crate::core::error::FormatError;

// --- Grid Coordinates ---

/// Position of a tile on the tile grid (center tile of a radius-0 deployment is (0, 0)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, z: i32) -> Self { TileCoord { x, z } }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Position of a region container on the region grid; also names its file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    pub fn new(x: i32, z: i32) -> Self { RegionCoord { x, z } }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        RegionCoord { x: self.x + dx, z: self.z + dz }
    }

    /// `r.<x>.<z>.mca`
    pub fn file_name(&self) -> String {
        format!("r.{}.{}.mca", self.x, self.z)
    }

    /// Parses `r.<x>.<z>.mca`; anything else is not a region file.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let mut parts = name.strip_prefix("r.")?.strip_suffix(".mca")?.split('.');
        let x = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(RegionCoord { x, z })
    }

    /// Chunk-grid coordinate of this region's (0, 0) slot.
    pub fn first_chunk(&self) -> (i32, i32) {
        (self.x * CHUNKS_PER_REGION_AXIS, self.z * CHUNKS_PER_REGION_AXIS)
    }

    /// Block-space coordinate of this region's north-west corner.
    pub fn block_origin(&self) -> BlockOffset {
        BlockOffset {
            x: self.x * BLOCKS_PER_REGION_AXIS,
            z: self.z * BLOCKS_PER_REGION_AXIS,
        }
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

/// Horizontal block-space translation applied to absolute positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct BlockOffset {
    pub x: i32,
    pub z: i32,
}

/// A chunk slot inside one region container, both axes in [0, 32).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkSlot {
    cx: u8,
    cz: u8,
}

impl ChunkSlot {
    pub fn new(cx: i32, cz: i32) -> Result<Self, FormatError> {
        if !(0..CHUNKS_PER_REGION_AXIS).contains(&cx) || !(0..CHUNKS_PER_REGION_AXIS).contains(&cz) {
            return Err(FormatError::SlotOutOfRange(cx, cz));
        }
        Ok(ChunkSlot { cx: cx as u8, cz: cz as u8 })
    }

    pub fn cx(&self) -> i32 { self.cx as i32 }
    pub fn cz(&self) -> i32 { self.cz as i32 }

    /// Header table index, `cx + cz * 32`.
    pub fn index(&self) -> usize {
        self.cx as usize + self.cz as usize * CHUNKS_PER_REGION_AXIS as usize
    }

    /// Every slot in the order the copier visits them (x outer, z inner).
    pub fn all() -> impl Iterator<Item = ChunkSlot> {
        (0..CHUNKS_PER_REGION_AXIS as u8)
            .flat_map(|cx| (0..CHUNKS_PER_REGION_AXIS as u8).map(move |cz| ChunkSlot { cx, cz }))
    }
}

// --- Tile Results ---

/// Structured outcome of one tile job, handed to the reporting layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileReport {
    pub ordinal: usize,
    pub name: String,
    pub host: String,
    pub x: i32,
    pub z: i32,
    pub regions: usize,
    pub chunks: usize,
    pub failed_regions: usize,
    pub failed_chunks: usize,
    pub empty: bool,
    pub pruned: bool,
    pub errors: Vec<String>,
}

impl TileReport {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.z)
    }
}

/// A tile whose job faulted before it could produce a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileFailure {
    pub ordinal: usize,
    pub x: i32,
    pub z: i32,
    pub message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DeploySummary {
    pub total: usize,
    pub produced: usize,
    pub pruned: usize,
    pub reports: Vec<TileReport>,
    pub failures: Vec<TileFailure>,
}

impl DeploySummary {
    pub fn chunks_copied(&self) -> usize {
        self.reports.iter().map(|r| r.chunks).sum()
    }

    pub fn report_for(&self, coord: TileCoord) -> Option<&TileReport> {
        self.reports.iter().find(|r| r.coord() == coord)
    }
}

// minetile_deployer/deployer/src/world/tiling.rs
use crate::core::config::DeployConfig;
use crate::core::constants::{
    BLOCKS_PER_REGION_AXIS, CHUNKS_PER_REGION_AXIS, DEFAULT_HOST, DEFAULT_NAME_FORMAT, REGION_WINDOW_MARGIN, TILE_SIZE_GRANULARITY,
};
use crate::core::error::{DeployError, DeployResult};
use crate::core::types::{RegionCoord, TileCoord};
use std::collections::HashMap;

/// One unit of tile work, fixed before any job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    pub ordinal: usize,
    pub coord: TileCoord,
    pub name: String,
    pub host: String,
}

/// A source region file and the tile-local region it is copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCell {
    pub source: RegionCoord,
    pub local: RegionCoord,
}

/// The square of tiles around a center tile.
#[derive(Debug, Clone, Copy)]
pub struct TileGrid {
    center: TileCoord,
    radius: u32,
    tile_size: u32,
}

impl TileGrid {
    pub fn new(center: TileCoord, radius: u32, tile_size: u32) -> DeployResult<Self> {
        if radius == 0 {
            return Err(DeployError::ConfigError("Radius is set to 0".into()));
        }
        if tile_size == 0 || tile_size % TILE_SIZE_GRANULARITY != 0 {
            return Err(DeployError::ConfigError(format!(
                "tile_size should be a positive multiple of {}, got {}",
                TILE_SIZE_GRANULARITY, tile_size
            )));
        }
        // Every block coordinate a window can touch has to fit an i32.
        let m = (tile_size as i128 + CHUNKS_PER_REGION_AXIS as i128 - 1) / CHUNKS_PER_REGION_AXIS as i128;
        let reach = center.x.unsigned_abs().max(center.z.unsigned_abs()) as i128 + radius as i128;
        let furthest_region = 2 * m * reach + m + REGION_WINDOW_MARGIN as i128;
        if furthest_region * BLOCKS_PER_REGION_AXIS as i128 > i32::MAX as i128 {
            return Err(DeployError::ConfigError(format!(
                "Tile grid around {} with radius {} and tile_size {} reaches past the world coordinate range",
                center, radius, tile_size
            )));
        }
        Ok(TileGrid { center, radius, tile_size })
    }

    pub fn from_config(config: &DeployConfig) -> DeployResult<Self> {
        Self::new(TileCoord::new(config.center_x, config.center_z), config.radius, config.tile_size)
    }

    pub fn radius(&self) -> u32 { self.radius }
    pub fn tile_size(&self) -> u32 { self.tile_size }

    /// `(2r + 1)^2`, equal to `1 + sum(8i for i in 1..=r)`.
    pub fn tile_count(&self) -> usize {
        let side = 2 * self.radius as usize + 1;
        side * side
    }

    /// Tile coordinates in ordinal order: x outer, z inner.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let r = self.radius as i32;
        (-r..=r).flat_map(move |dx| (-r..=r).map(move |dz| TileCoord::new(self.center.x + dx, self.center.z + dz)))
    }

    /// Region cells from a tile's center to its edge, `ceil(tile_size / 32)`.
    pub fn regions_per_side(&self) -> i32 {
        (self.tile_size as i32 + CHUNKS_PER_REGION_AXIS - 1) / CHUNKS_PER_REGION_AXIS
    }

    /// Region cells a tile spans along one axis.
    pub fn region_grid_size(&self) -> i32 {
        2 * self.regions_per_side()
    }

    /// Chunks along one side of a tile.
    pub fn chunks_per_side(&self) -> u32 {
        2 * self.tile_size
    }

    /// Source region that becomes the tile's local region (0, 0).
    pub fn world_offset(&self, tile: TileCoord) -> RegionCoord {
        let grid = self.region_grid_size();
        RegionCoord::new(grid * tile.x, grid * tile.z)
    }

    /// Every region the tile copies, x outer, z inner. The exact cover is
    /// `[-m, m - 1]` around the offset; the window adds the margin on both sides.
    pub fn source_window(&self, tile: TileCoord) -> Vec<WindowCell> {
        let m = self.regions_per_side();
        let offset = self.world_offset(tile);
        let range = (-m - REGION_WINDOW_MARGIN)..=(m - 1 + REGION_WINDOW_MARGIN);
        range
            .clone()
            .flat_map(|sx| {
                range.clone().map(move |sz| WindowCell {
                    source: offset.offset(sx, sz),
                    local: RegionCoord::new(sx, sz),
                })
            })
            .collect()
    }

    /// Names and hosts every tile. Empty lists fall back to the defaults.
    pub fn plan(&self, names: &[String], hosts: &[String]) -> Vec<TilePlan> {
        self.coords()
            .enumerate()
            .map(|(ordinal, coord)| TilePlan {
                ordinal,
                coord,
                name: tile_name(names, ordinal, coord),
                host: tile_host(hosts, ordinal),
            })
            .collect()
    }
}

/// `names[ordinal % len]` with `%x` and `%z` replaced by the tile coordinates.
pub fn tile_name(names: &[String], ordinal: usize, coord: TileCoord) -> String {
    let template = match names {
        [] => DEFAULT_NAME_FORMAT,
        list => list[ordinal % list.len()].as_str(),
    };
    template.replace("%x", &coord.x.to_string()).replace("%z", &coord.z.to_string())
}

/// Every tile owns its container directory, so resolved names must be distinct
/// single path components.
pub fn ensure_unique_names(plans: &[TilePlan]) -> DeployResult<()> {
    let mut seen: HashMap<&str, TileCoord> = HashMap::with_capacity(plans.len());
    for plan in plans {
        let name = plan.name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(DeployError::ConfigError(format!(
                "Tile {} resolves to unusable container name '{}'",
                plan.coord, name
            )));
        }
        if let Some(first) = seen.insert(name, plan.coord) {
            return Err(DeployError::ConfigError(format!(
                "Tiles {} and {} both resolve to container name '{}', add %x and %z to the name or list more names",
                first, plan.coord, name
            )));
        }
    }
    Ok(())
}

pub fn tile_host(hosts: &[String], ordinal: usize) -> String {
    match hosts {
        [] => DEFAULT_HOST.to_string(),
        list => list[ordinal % list.len()].clone(),
    }
}

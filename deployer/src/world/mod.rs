// minetile_deployer/deployer/src/world/mod.rs
pub mod level;
pub mod remap;
pub mod tiling;

pub use level::build_tile_level;
pub use remap::{remap_chunk, RemapStats, RemapTarget};
pub use tiling::{TileGrid, TilePlan, WindowCell};

// minetile_deployer/deployer/src/core/constants.rs

// Region container layout
pub const SECTOR_BYTES: usize = 4096;
pub const CHUNKS_PER_REGION_AXIS: i32 = 32;
pub const REGION_SLOTS: usize = (CHUNKS_PER_REGION_AXIS * CHUNKS_PER_REGION_AXIS) as usize;
pub const HEADER_BYTES: usize = 2 * SECTOR_BYTES; // locations + timestamps
pub const HEADER_SECTORS: u32 = (HEADER_BYTES / SECTOR_BYTES) as u32;
pub const MAX_SECTORS_PER_CHUNK: usize = 255;
pub const CHUNK_RECORD_PREFIX_BYTES: usize = 5; // u32 length + u8 compression marker

// World geometry
pub const BLOCKS_PER_CHUNK_AXIS: i32 = 16;
pub const BLOCKS_PER_REGION_AXIS: i32 = CHUNKS_PER_REGION_AXIS * BLOCKS_PER_CHUNK_AXIS; // 512

// Tag documents
pub const MAX_TAG_DEPTH: usize = 512;

// World metadata
pub const LEVEL_VERSION: i32 = 19133;
pub const LEVEL_FILE_NAME: &str = "level.dat";
pub const REGION_DIR_NAME: &str = "region";
pub const CONTAINERS_DIR_NAME: &str = "containers";

// Tiling
pub const DEFAULT_NAME_FORMAT: &str = "MineTile.%x.%z";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_TILE_SIZE: u32 = 16; // chunks from tile center to edge -> 32x32 chunks
pub const TILE_SIZE_GRANULARITY: u32 = 16;
/// Extra region cells read on each side of a tile's exact region cover.
pub const REGION_WINDOW_MARGIN: i32 = 1;
pub const DEFAULT_THREADS: usize = 4;

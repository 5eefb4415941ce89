// minetile_deployer/deployer/src/region/mod.rs
pub mod compression;
pub mod region_file;

pub use compression::CompressionScheme;
pub use region_file::RegionFile;

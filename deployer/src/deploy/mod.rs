// minetile_deployer/deployer/src/deploy/mod.rs
pub mod orchestrator;
pub mod tile_job;

pub use orchestrator::deploy;

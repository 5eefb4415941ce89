// minetile_deployer/deployer/src/core/mod.rs
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

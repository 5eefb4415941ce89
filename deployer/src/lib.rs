// minetile_deployer/deployer/src/lib.rs

// Package and build metadata written by build.rs
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub mod core;
pub mod nbt;
pub mod region;
pub mod world;
pub mod concurrent;
pub mod deploy;
pub mod operational;

pub use crate::core::config::DeployConfig;
pub use crate::core::error::{DeployError, DeployResult};
pub use crate::deploy::deploy;

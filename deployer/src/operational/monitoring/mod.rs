// minetile_deployer/deployer/src/operational/monitoring/mod.rs
pub mod metrics;

// minetile_deployer/deployer/src/operational/mod.rs
pub mod monitoring;
pub mod report;

pub use report::ReportLog;

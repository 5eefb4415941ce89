// minetile_deployer/deployer/src/concurrent/mod.rs
pub mod thread_pools;

pub use thread_pools::create_pool;

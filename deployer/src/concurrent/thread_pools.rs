// minetile_deployer/deployer/src/concurrent/thread_pools.rs
use crate::core::error::{DeployError, DeployResult};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, warn};

/// Builds the fixed-size pool tile jobs run on.
///
/// Jobs catch their own panics; the handler only sees what escapes them.
pub fn create_pool(name_str: &str, num_threads: usize) -> DeployResult<ThreadPool> {
    if num_threads == 0 {
        return Err(DeployError::ThreadingError(format!(
            "Thread pool '{}' configured with 0 threads",
            name_str
        )));
    }

    let available_cores = num_cpus::get();
    if num_threads > available_cores {
        warn!(
            "Requested {} threads for pool '{}', but only {} cores are available. Tile jobs are I/O heavy, continuing.",
            num_threads, name_str, available_cores
        );
    }

    let name_for_thread_name = name_str.to_string();
    let name_for_start_handler = name_str.to_string();
    let name_for_panic_handler = name_str.to_string();

    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(move |i| format!("{}-{}", name_for_thread_name, i))
        .start_handler(move |thread_idx_in_pool| {
            debug!("Started worker {}-{}", name_for_start_handler, thread_idx_in_pool);
        })
        .panic_handler(move |payload| {
            error!(
                "Unhandled panic in pool '{}': {}",
                name_for_panic_handler,
                panic_message(payload.as_ref())
            );
        })
        .build()
        .map_err(|e| DeployError::ThreadingError(format!("Failed to build {} pool: {}", name_str, e)))
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// minetile_deployer/deployer/src/main.rs
use minetile_deployer::built_info;
use minetile_deployer::core::config::DeployConfig;
use minetile_deployer::operational::monitoring::metrics::{init_logging, MetricsSystem};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_CONFIG_PATH: &str = "deployer.yml";

fn main() -> anyhow::Result<()> {
    // MUST be the very first line
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("Location: {}:{}:{}", location.file(), location.line(), location.column());
        }
        eprintln!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
    }));

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {:?}", e);
        return Err(e);
    }

    info!(
        "{} {} ({}) starting up...",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::TARGET
    );

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut dry_run = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            _ => config_path = PathBuf::from(arg),
        }
    }

    let mut config = if config_path.exists() {
        DeployConfig::from_yaml_file(&config_path)?
    } else {
        warn!("Configuration {} not found, using defaults", config_path.display());
        DeployConfig::default()
    };
    config.dry_run |= dry_run;
    info!(
        "Configuration loaded. Input: {}, output: {}, radius: {}, tile size: {}, threads: {}",
        config.input.display(),
        config.output.display(),
        config.radius,
        config.tile_size,
        config.threads
    );

    let metrics = MetricsSystem::new(config.metrics_listen)?;

    let summary = match minetile_deployer::deploy(&config) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Deployment aborted: {}", e);
            return Err(e.into());
        }
    };
    metrics.record_run(&summary);

    for failure in &summary.failures {
        error!("Tile {},{} (#{}) failed: {}", failure.x, failure.z, failure.ordinal, failure.message);
    }
    for report in summary.reports.iter().filter(|r| !r.errors.is_empty()) {
        warn!("Tile {} ({}) finished with {} errors", report.coord(), report.name, report.errors.len());
    }
    info!(
        "MineTile deployer done: {} tiles, {} produced, {} pruned, {} failed",
        summary.total,
        summary.produced,
        summary.pruned,
        summary.failures.len()
    );
    Ok(())
}

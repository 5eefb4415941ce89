// minetile_deployer/deployer/src/operational/monitoring/metrics.rs
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::core::types::{DeploySummary, TileReport};

pub struct MetricsSystem {
    start_time: Instant,
}

impl MetricsSystem {
    /// Describes the deploy metrics and, with `listen`, serves them for Prometheus.
    /// Without a listener the macros record into nothing.
    pub fn new(listen: Option<SocketAddr>) -> Result<Self> {
        if let Some(addr) = listen {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("Failed to install Prometheus exporter")?;
        }

        describe_counter!("deploy_tiles_total", "Tiles finished, labelled by outcome");
        describe_counter!("deploy_regions_copied_total", "Source region files copied into tiles");
        describe_counter!("deploy_regions_failed_total", "Source region files that could not be copied");
        describe_counter!("deploy_chunks_copied_total", "Chunks written into tile regions");
        describe_counter!("deploy_chunks_failed_total", "Chunks skipped because they could not be read or placed");
        describe_histogram!("deploy_tile_time_seconds", "Time spent on one tile job in seconds");
        describe_histogram!("deploy_run_time_seconds", "Wall time of a whole deployment in seconds");

        Ok(MetricsSystem { start_time: Instant::now() })
    }

    pub fn record_run(&self, summary: &DeploySummary) {
        histogram!("deploy_run_time_seconds").record(self.start_time.elapsed().as_secs_f64());
        tracing::debug!(
            "Recorded run metrics: {} produced, {} pruned, {} failed",
            summary.produced,
            summary.pruned,
            summary.failures.len()
        );
    }
}

pub fn record_tile(report: &TileReport, duration: f64) {
    let outcome = if report.pruned {
        "pruned"
    } else if report.empty {
        "empty"
    } else {
        "produced"
    };
    counter!("deploy_tiles_total", "outcome" => outcome).increment(1);
    counter!("deploy_regions_copied_total").increment((report.regions - report.failed_regions) as u64);
    counter!("deploy_regions_failed_total").increment(report.failed_regions as u64);
    counter!("deploy_chunks_copied_total").increment(report.chunks as u64);
    counter!("deploy_chunks_failed_total").increment(report.failed_chunks as u64);
    histogram!("deploy_tile_time_seconds").record(duration);
}

pub fn record_tile_failure() {
    counter!("deploy_tiles_total", "outcome" => "failed").increment(1);
}

// Logging setup. `MINETILE_LOG_JSON` switches to one JSON object per line.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "minetile_deployer=info,warn".into()));
    let installed = if std::env::var_os("MINETILE_LOG_JSON").is_some() {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    installed.context("Failed to initialize tracing subscriber")?;

    Ok(())
}

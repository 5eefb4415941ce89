// minetile_deployer/deployer/src/deploy/orchestrator.rs
use crossbeam::channel;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::tile_job::{run_tile, TileJobContext};
use crate::concurrent::thread_pools::{create_pool, panic_message};
use crate::core::config::DeployConfig;
use crate::core::constants::{BLOCKS_PER_CHUNK_AXIS, CONTAINERS_DIR_NAME};
use crate::core::error::{DeployError, DeployResult};
use crate::core::types::{DeploySummary, TileFailure, TileReport};
use crate::nbt::{self, Document};
use crate::operational::monitoring::metrics;
use crate::operational::ReportLog;
use crate::world::tiling::{ensure_unique_names, TileGrid, TilePlan};

enum TileOutcome {
    Done(TileReport),
    Failed(TileFailure),
}

impl TileOutcome {
    fn ordinal(&self) -> usize {
        match self {
            TileOutcome::Done(report) => report.ordinal,
            TileOutcome::Failed(failure) => failure.ordinal,
        }
    }
}

/// Splits the configured world into tiles.
///
/// Returns `Err` only for problems found before any tile work starts; everything that
/// goes wrong inside a tile ends up in the summary.
pub fn deploy(config: &DeployConfig) -> DeployResult<DeploySummary> {
    config.validate()?;
    let grid = TileGrid::from_config(config)?;
    let plans = grid.plan(&config.names, &config.hosts);
    ensure_unique_names(&plans)?;
    let game_rules = config.effective_game_rules()?;

    let chunks = grid.chunks_per_side();
    let blocks = chunks as i64 * BLOCKS_PER_CHUNK_AXIS as i64;
    let side = 2 * grid.radius() as i64 + 1;
    info!(
        "Deploying {} tiles of {}x{} chunks ({}x{} blocks), {}x{} blocks in total",
        plans.len(),
        chunks,
        chunks,
        blocks,
        blocks,
        blocks * side,
        blocks * side
    );

    if config.dry_run {
        for plan in &plans {
            info!("[dry run] tile {} #{} -> {} on {}", plan.coord, plan.ordinal, plan.name, plan.host);
        }
        return Ok(DeploySummary { total: plans.len(), ..Default::default() });
    }

    let containers_dir = config.output.join(CONTAINERS_DIR_NAME);
    fs::create_dir_all(&containers_dir).map_err(|e| {
        DeployError::ConfigError(format!("Cannot create output directory {}: {}", containers_dir.display(), e))
    })?;
    let report_log = ReportLog::open(config.report_path()).map_err(|e| {
        DeployError::ConfigError(format!("Cannot open report file {}: {}", config.report_path().display(), e))
    })?;

    let ctx = Arc::new(TileJobContext {
        grid,
        source_regions: config.region_dir(),
        containers_dir,
        world_name: config.world_name.clone(),
        source_level: load_source_level(config),
        game_rules,
        delete_empty_tiles: config.delete_empty_tiles,
        report_log: Some(report_log),
    });

    let pool = create_pool("tile", config.effective_threads(plans.len()))?;
    let started = Instant::now();
    let total = plans.len();

    let (tx, rx) = channel::unbounded::<TileOutcome>();
    for plan in plans {
        let tx = tx.clone();
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            let outcome = run_guarded(&ctx, &plan);
            // The receiver lives until every sender is gone.
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    let mut outcomes: Vec<TileOutcome> = rx.iter().collect();
    outcomes.sort_by_key(TileOutcome::ordinal);

    let mut summary = DeploySummary { total, ..Default::default() };
    for outcome in outcomes {
        match outcome {
            TileOutcome::Done(report) => {
                if report.pruned {
                    summary.pruned += 1;
                } else {
                    summary.produced += 1;
                }
                summary.reports.push(report);
            }
            TileOutcome::Failed(failure) => summary.failures.push(failure),
        }
    }

    info!(
        "Deployment finished in {:.2}s: {} of {} tiles produced, {} pruned, {} failed, {} chunks copied",
        started.elapsed().as_secs_f64(),
        summary.produced,
        summary.total,
        summary.pruned,
        summary.failures.len(),
        summary.chunks_copied()
    );
    Ok(summary)
}

/// Runs one tile job, turning errors and panics into a failure for that tile alone.
fn run_guarded(ctx: &TileJobContext, plan: &TilePlan) -> TileOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| run_tile(ctx, plan)));
    let message = match result {
        Ok(Ok(report)) => return TileOutcome::Done(report),
        Ok(Err(e)) => DeployError::JobError { x: plan.coord.x, z: plan.coord.z, message: e.to_string() }.to_string(),
        Err(payload) => DeployError::JobError {
            x: plan.coord.x,
            z: plan.coord.z,
            message: format!("panicked: {}", panic_message(payload.as_ref())),
        }
        .to_string(),
    };
    error!("{}", message);
    metrics::record_tile_failure();
    TileOutcome::Failed(TileFailure { ordinal: plan.ordinal, x: plan.coord.x, z: plan.coord.z, message })
}

/// The source metadata, read once and shared by every tile. Tiles still get a
/// valid metadata document when it is missing or unreadable.
fn load_source_level(config: &DeployConfig) -> Option<Document> {
    let path = config.level_file();
    if !path.is_file() {
        warn!("{}", DeployError::NotFound(format!("world metadata {}", path.display())));
        return None;
    }
    match nbt::read_gzip_file(&path) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Cannot read world metadata {}: {}, tiles start from empty metadata", path.display(), e);
            None
        }
    }
}

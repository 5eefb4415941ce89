// minetile_deployer/deployer/src/deploy/tile_job.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::config::GameRules;
use crate::core::constants::{LEVEL_FILE_NAME, REGION_DIR_NAME};
use crate::core::error::{DeployError, DeployResult, RegionResult};
use crate::core::types::TileReport;
use crate::nbt::{self, Document};
use crate::operational::monitoring::metrics;
use crate::operational::ReportLog;
use crate::region::RegionFile;
use crate::world::level::build_tile_level;
use crate::world::remap::{remap_chunk, RemapTarget};
use crate::world::tiling::{TileGrid, TilePlan, WindowCell};

/// Read-only state shared by every tile job of one deployment.
pub struct TileJobContext {
    pub grid: TileGrid,
    /// Source `region/` directory.
    pub source_regions: PathBuf,
    /// Parent of every tile's container directory.
    pub containers_dir: PathBuf,
    pub world_name: String,
    pub source_level: Option<Document>,
    pub game_rules: Option<GameRules>,
    pub delete_empty_tiles: bool,
    pub report_log: Option<ReportLog>,
}

impl TileJobContext {
    pub fn container_dir(&self, plan: &TilePlan) -> PathBuf {
        self.containers_dir.join(&plan.name)
    }

    pub fn world_dir(&self, plan: &TilePlan) -> PathBuf {
        self.container_dir(plan).join(&self.world_name)
    }
}

#[derive(Debug, Default)]
struct RegionCopy {
    chunks: usize,
    failed_chunks: usize,
    errors: Vec<String>,
}

/// Produces one tile: metadata, every region of its window, then pruning and reporting.
///
/// Chunk and region problems are recorded in the report. Only failures that leave the
/// tile unusable (its directories or metadata cannot be written) are returned as errors.
pub fn run_tile(ctx: &TileJobContext, plan: &TilePlan) -> DeployResult<TileReport> {
    let started = Instant::now();
    let container = ctx.container_dir(plan);
    let world_dir = ctx.world_dir(plan);
    let region_out = world_dir.join(REGION_DIR_NAME);
    fs::create_dir_all(&region_out)?;

    let level = build_tile_level(ctx.source_level.as_ref(), plan.coord, ctx.game_rules.as_ref());
    nbt::write_gzip_file(&world_dir.join(LEVEL_FILE_NAME), &level)?;

    let mut report = TileReport {
        ordinal: plan.ordinal,
        name: plan.name.clone(),
        host: plan.host.clone(),
        x: plan.coord.x,
        z: plan.coord.z,
        regions: 0,
        chunks: 0,
        failed_regions: 0,
        failed_chunks: 0,
        empty: false,
        pruned: false,
        errors: Vec::new(),
    };

    let world_offset = ctx.grid.world_offset(plan.coord);
    for cell in ctx.grid.source_window(plan.coord) {
        let source = match locate_source(&ctx.source_regions, &cell) {
            Ok(path) => path,
            Err(e) => {
                warn!("Tile {}: {}, skipping", plan.coord, e);
                continue;
            }
        };
        report.regions += 1;

        let destination = region_out.join(cell.local.file_name());
        let target = RemapTarget::new(cell.local, world_offset);
        match copy_region(&source, &destination, &target) {
            Ok(copy) => {
                debug!(
                    "Tile {}: copied {} chunks from {} to {}",
                    plan.coord,
                    copy.chunks,
                    cell.source.file_name(),
                    cell.local.file_name()
                );
                report.chunks += copy.chunks;
                report.failed_chunks += copy.failed_chunks;
                report.errors.extend(copy.errors);
            }
            Err(e) => {
                warn!("Tile {}: region {} failed: {}", plan.coord, cell.source.file_name(), e);
                report.failed_regions += 1;
                report.errors.push(format!("{}: {}", cell.source.file_name(), e));
            }
        }
    }

    if report.regions == 0 {
        report.empty = true;
        if ctx.delete_empty_tiles {
            fs::remove_dir_all(&container)?;
            report.pruned = true;
            info!("Tile {} ({}) has no source regions, removed", plan.coord, plan.name);
        } else {
            info!("Tile {} ({}) has no source regions", plan.coord, plan.name);
        }
    } else {
        info!(
            "Tile {} ({}) finished: {} regions, {} chunks, {} failed chunks",
            plan.coord, plan.name, report.regions, report.chunks, report.failed_chunks
        );
    }

    if !report.pruned {
        if let Some(log) = &ctx.report_log {
            if let Err(e) = log.append(&report) {
                warn!("Tile {}: could not append to {}: {}", plan.coord, log.path().display(), e);
            }
        }
    }

    metrics::record_tile(&report, started.elapsed().as_secs_f64());
    Ok(report)
}

fn locate_source(region_dir: &Path, cell: &WindowCell) -> DeployResult<PathBuf> {
    let path = region_dir.join(cell.source.file_name());
    if path.is_file() {
        Ok(path)
    } else {
        Err(DeployError::NotFound(format!("source region {}", path.display())))
    }
}

/// Copies every readable chunk of `source` into a fresh `destination`, remapped for `target`.
///
/// Unreadable chunks are skipped and counted; failing to open either file or to
/// write a chunk fails the whole region.
fn copy_region(source: &Path, destination: &Path, target: &RemapTarget) -> RegionResult<RegionCopy> {
    if destination.exists() {
        fs::remove_file(destination)?;
    }
    let mut input = RegionFile::open_for_read(source)?;
    let mut output = RegionFile::open_or_create_for_write(destination)?;
    let mut copy = RegionCopy::default();

    for slot in input.occupied_slots() {
        let (cx, cz) = (slot.cx(), slot.cz());
        let mut chunk = match input.read_chunk(cx, cz) {
            Ok(Some(chunk)) => chunk,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping chunk ({}, {}) of {}: {}", cx, cz, source.display(), e);
                copy.failed_chunks += 1;
                copy.errors.push(format!("{} chunk ({}, {}): {}", file_label(source), cx, cz, e));
                continue;
            }
        };

        let stats = remap_chunk(&mut chunk.root, cx, cz, target);
        if !stats.positioned {
            warn!("Skipping chunk ({}, {}) of {}: no position fields", cx, cz, source.display());
            copy.failed_chunks += 1;
            copy.errors.push(format!("{} chunk ({}, {}): no position fields", file_label(source), cx, cz));
            continue;
        }
        if stats.skipped > 0 {
            debug!("Chunk ({}, {}) of {}: {} entries without positions left as-is", cx, cz, source.display(), stats.skipped);
        }

        output.write_chunk(cx, cz, &chunk)?;
        output.set_timestamp(cx, cz, input.timestamp(cx, cz)?)?;
        copy.chunks += 1;
    }

    output.close()?;
    Ok(copy)
}

fn file_label(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

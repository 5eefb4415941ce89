// minetile_deployer/deployer/src/core/config.rs
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::constants::{
    DEFAULT_THREADS, DEFAULT_TILE_SIZE, LEVEL_FILE_NAME, REGION_DIR_NAME,
};
use super::error::{DeployError, DeployResult};
use crate::world::tiling::TileGrid;

/// Game-rule name to value. Ordered so the emitted compound is identical on every run.
pub type GameRules = BTreeMap<String, String>;

/// Protective rules applied to every tile when game-rule overwriting is enabled.
pub fn default_game_rule_overrides() -> GameRules {
    [
        ("doDaylightCycle", "false"),
        ("commandBlockOutput", "false"),
        ("doEntityDrops", "false"),
        ("doFireTick", "false"),
        ("doLimitedCrafting", "true"),
        ("doMobLoot", "false"),
        ("doMobSpawning", "false"),
        ("doTileDrops", "false"),
        ("doWeatherCycle", "false"),
        ("mobGriefing", "false"),
        ("spectatorsGenerateChunks", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// World input: directory containing `region/` and `level.dat`.
    pub input: PathBuf,
    pub output: PathBuf,
    /// Name of the world directory created inside every container.
    pub world_name: String,
    /// Tiles around the center tile; radius 1 yields 9 tiles.
    pub radius: u32,
    pub center_x: i32,
    pub center_z: i32,
    /// Chunks from a tile's center to its edge; must be a multiple of 16.
    pub tile_size: u32,
    pub names: Vec<String>,
    pub hosts: Vec<String>,
    pub overwrite_game_rules: bool,
    /// Merged over the default protective rules.
    pub game_rules: GameRules,
    /// Optional YAML string map merged over `game_rules`.
    pub game_rules_file: Option<PathBuf>,
    pub delete_empty_tiles: bool,
    pub threads: usize,
    pub dry_run: bool,
    /// Append-only JSON-lines report, relative paths resolve against `output`.
    pub report_file: PathBuf,
    pub metrics_listen: Option<SocketAddr>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            input: PathBuf::from("./world"),
            output: PathBuf::from("./deploy"),
            world_name: "world".to_string(),
            radius: 1,
            center_x: 0,
            center_z: 0,
            tile_size: DEFAULT_TILE_SIZE,
            names: Vec::new(),
            hosts: Vec::new(),
            overwrite_game_rules: false,
            game_rules: GameRules::new(),
            game_rules_file: None,
            delete_empty_tiles: true,
            threads: DEFAULT_THREADS,
            dry_run: false,
            report_file: PathBuf::from("tiles.jsonl"),
            metrics_listen: None,
        }
    }
}

impl DeployConfig {
    pub fn from_yaml_str(yaml: &str) -> DeployResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DeployError::ConfigError(format!("Invalid deploy configuration: {}", e)))
    }

    pub fn from_yaml_file(path: &Path) -> DeployResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DeployError::ConfigError(format!("Cannot read configuration {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn region_dir(&self) -> PathBuf {
        self.input.join(REGION_DIR_NAME)
    }

    pub fn level_file(&self) -> PathBuf {
        self.input.join(LEVEL_FILE_NAME)
    }

    pub fn report_path(&self) -> PathBuf {
        if self.report_file.is_absolute() {
            self.report_file.clone()
        } else {
            self.output.join(&self.report_file)
        }
    }

    /// Checks everything that must hold before any tile work starts.
    pub fn validate(&self) -> DeployResult<()> {
        TileGrid::from_config(self)?;
        if self.threads == 0 {
            return Err(DeployError::ConfigError("threads must be at least 1".into()));
        }
        if self.world_name.is_empty() || self.world_name.contains(['/', '\\']) {
            return Err(DeployError::ConfigError(format!("Invalid world name '{}'", self.world_name)));
        }
        if !self.input.is_dir() {
            return Err(DeployError::ConfigError(format!(
                "Input directory {} not found",
                self.input.display()
            )));
        }
        if !self.region_dir().is_dir() {
            return Err(DeployError::ConfigError(format!(
                "World directory {} does not contain a region directory",
                self.input.display()
            )));
        }
        if self.output.exists() && !self.output.is_dir() {
            return Err(DeployError::ConfigError(format!(
                "Output path {} exists and is not a directory",
                self.output.display()
            )));
        }
        Ok(())
    }

    /// Overrides written into every tile's `GameRules`, or `None` when overwriting is off.
    pub fn effective_game_rules(&self) -> DeployResult<Option<GameRules>> {
        if !self.overwrite_game_rules {
            return Ok(None);
        }
        let mut rules = default_game_rule_overrides();
        rules.extend(self.game_rules.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(path) = &self.game_rules_file {
            if path.exists() {
                let text = std::fs::read_to_string(path)?;
                let file_rules: GameRules = serde_yaml::from_str(&text).map_err(|e| {
                    DeployError::ConfigError(format!("Invalid game rule file {}: {}", path.display(), e))
                })?;
                info!("Loaded {} game rule overrides from {}", file_rules.len(), path.display());
                rules.extend(file_rules);
            } else {
                warn!("Game rule file {} not found, using configured overrides only", path.display());
            }
        }
        Ok(Some(rules))
    }

    /// Worker count, capped at the number of tiles.
    pub fn effective_threads(&self, tile_count: usize) -> usize {
        self.threads.min(tile_count.max(1))
    }
}

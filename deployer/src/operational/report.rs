// minetile_deployer/deployer/src/operational/report.rs
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::error::{DeployError, DeployResult};
use crate::core::types::TileReport;

/// Append-only JSON-lines record of produced tiles, shared by every tile job.
pub struct ReportLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ReportLog {
    pub fn open(path: impl AsRef<Path>) -> DeployResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(ReportLog { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one line per call in a single `write_all`, so concurrent lines never interleave.
    pub fn append(&self, report: &TileReport) -> DeployResult<()> {
        let mut line = serde_json::to_vec(report).map_err(|e| DeployError::Serialization(e.to_string()))?;
        line.push(b'\n');
        let mut file = self.file.lock();
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

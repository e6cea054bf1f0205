//! Persist planned paths for later inspection

use std::path::{Path as FsPath, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::types::{Path, Waypoint};

/// On-disk record of one planned path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub session: Uuid,
    pub target: String,
    pub waypoints: Vec<Waypoint>,
}

/// Write `path` to `<dir>/<target>_<session>.json`, creating `dir` if needed
pub fn save_path(dir: &FsPath, target: &str, session: Uuid, path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let stem: String = target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let file = dir.join(format!("{}_{}.json", stem, session));

    let record = PathRecord {
        session,
        target: target.to_string(),
        waypoints: path.waypoints.clone(),
    };
    std::fs::write(&file, serde_json::to_string_pretty(&record)?)?;

    tracing::info!(file = %file.display(), waypoints = path.len(), "saved planned path");
    Ok(file)
}

/// Read back a record written by `save_path`
pub fn load_path(file: &FsPath) -> Result<PathRecord> {
    let content = std::fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

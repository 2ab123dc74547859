//! JSON export of finished runs.

use crate::scenario::ScenarioConfig;
use serde::{Deserialize, Serialize};
use simlab_core::{MemberStats, MetricsSnapshot, SimulationEvent};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Identifying header of an exported scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioHeader {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Complete record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    pub scenario: ScenarioHeader,

    /// Seed every random stream was derived from
    pub seed: u64,

    pub configuration: ScenarioConfig,
    pub metrics: MetricsSnapshot,
    pub developers: Vec<MemberStats>,
    pub events: Vec<SimulationEvent>,
}

impl RunExport {
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        write_json(self, path)
    }
}

/// Pretty-prints `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

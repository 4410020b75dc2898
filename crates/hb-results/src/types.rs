//! Result data types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type BatchId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchManifest {
    pub batch_id: BatchId,
    pub name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// Source workspace the runs were cloned from.
    pub workspace: PathBuf,
    pub workers: usize,
    pub elapsed_s: f64,
    pub runs: Vec<RunRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub index: usize,
    pub set_name: String,
    pub set_hash: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the run; unknown when an external executor ran it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
}

impl BatchManifest {
    pub fn succeeded(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs
            .iter()
            .filter(|run| run.status == RunStatus::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter().filter(|run| run.status == RunStatus::Failed)
    }
}

//! Query helpers over recorded batch manifests.

use std::path::PathBuf;

use hb_results::{BatchManifest, RunRecord};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub batch_id: String,
    pub name: String,
    pub timestamp: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_s: f64,
    /// Mean over runs whose duration was measured.
    pub mean_run_s: Option<f64>,
}

pub fn get_batch_summary(manifest: &BatchManifest) -> BatchSummary {
    let durations: Vec<f64> = manifest.runs.iter().filter_map(|r| r.duration_s).collect();
    let mean_run_s = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };
    let succeeded = manifest.succeeded().count();

    BatchSummary {
        batch_id: manifest.batch_id.clone(),
        name: manifest.name.clone(),
        timestamp: manifest.timestamp.clone(),
        total: manifest.runs.len(),
        succeeded,
        failed: manifest.runs.len() - succeeded,
        elapsed_s: manifest.elapsed_s,
        mean_run_s,
    }
}

pub fn failed_runs(manifest: &BatchManifest) -> Vec<&RunRecord> {
    manifest.failed().collect()
}

/// Workspace directories of successful runs, in set order.
pub fn successful_workspaces(manifest: &BatchManifest) -> Vec<PathBuf> {
    manifest
        .succeeded()
        .filter_map(|run| run.workspace.clone())
        .collect()
}

pub fn find_run<'a>(manifest: &'a BatchManifest, set_name: &str) -> AppResult<&'a RunRecord> {
    manifest
        .runs
        .iter()
        .find(|run| run.set_name == set_name)
        .ok_or_else(|| AppError::InvalidInput(format!("No run for set '{}'", set_name)))
}

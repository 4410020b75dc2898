//! Batch file loading, saving, validation and path resolution.

use std::path::{Path, PathBuf};

use hb_project::BatchDef;

use crate::error::AppResult;

/// Summary of a parameter set for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSummary {
    pub name: String,
    pub files: Vec<String>,
    pub templates: Vec<String>,
    pub edit_count: usize,
}

pub fn load_batch(path: &Path) -> AppResult<BatchDef> {
    Ok(hb_project::load_yaml(path)?)
}

pub fn save_batch(path: &Path, batch: &BatchDef) -> AppResult<()> {
    Ok(hb_project::save_yaml(path, batch)?)
}

pub fn validate_batch(batch: &BatchDef) -> AppResult<()> {
    hb_project::validate_batch(batch).map_err(hb_project::ProjectError::from)?;
    Ok(())
}

/// Directory relative paths inside a batch file are resolved against.
pub fn base_dir(batch_path: &Path) -> PathBuf {
    match batch_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve(batch_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir(batch_path).join(path)
    }
}

pub fn resolve_workspace(batch_path: &Path, batch: &BatchDef) -> PathBuf {
    resolve(batch_path, &batch.workspace)
}

pub fn resolve_target_dir(batch_path: &Path, batch: &BatchDef) -> Option<PathBuf> {
    batch
        .target_dir
        .as_deref()
        .map(|target| resolve(batch_path, target))
}

/// Where the batch's manifests live: the target dir when set, the batch
/// file's directory otherwise.
pub fn store_dir(batch_path: &Path, batch: &BatchDef) -> PathBuf {
    resolve_target_dir(batch_path, batch).unwrap_or_else(|| base_dir(batch_path))
}

pub fn list_sets(batch: &BatchDef) -> Vec<SetSummary> {
    batch
        .sets
        .iter()
        .map(|set| SetSummary {
            name: set.name.clone(),
            files: set.parameters.iter().map(|p| p.file.clone()).collect(),
            templates: set.templates.iter().map(|t| t.template.clone()).collect(),
            edit_count: set.parameters.iter().map(|p| p.edits.len()).sum::<usize>()
                + set.templates.iter().map(|t| t.tokens.len()).sum::<usize>(),
        })
        .collect()
}

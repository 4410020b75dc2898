//! Error types for the hb-app service layer.

use std::path::PathBuf;

/// Unified error for every front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Batch file error: {0}")]
    Project(String),

    #[error("Failed to read batch file: {path}")]
    BatchFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Batch validation failed: {0}")]
    Validation(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Config patch error: {0}")]
    Patch(String),

    #[error("Run error: {0}")]
    Run(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<hb_project::ProjectError> for AppError {
    fn from(err: hb_project::ProjectError) -> Self {
        match err {
            hb_project::ProjectError::Validation(err) => AppError::Validation(err.to_string()),
            hb_project::ProjectError::Io { path, source } => {
                AppError::BatchFileRead { path, source }
            }
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<hb_workspace::WorkspaceError> for AppError {
    fn from(err: hb_workspace::WorkspaceError) -> Self {
        AppError::Workspace(err.to_string())
    }
}

impl From<hb_patch::PatchError> for AppError {
    fn from(err: hb_patch::PatchError) -> Self {
        AppError::Patch(err.to_string())
    }
}

impl From<hb_runner::RunError> for AppError {
    fn from(err: hb_runner::RunError) -> Self {
        AppError::Run(err.to_string())
    }
}

impl From<hb_results::ResultsError> for AppError {
    fn from(err: hb_results::ResultsError) -> Self {
        match err {
            hb_results::ResultsError::BatchNotFound { batch_id } => {
                AppError::BatchNotFound(batch_id)
            }
            other => AppError::Results(other.to_string()),
        }
    }
}

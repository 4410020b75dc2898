use std::path::PathBuf;

use hb_patch::PatchError;
use hb_table::TableError;
use hb_workspace::WorkspaceError;

pub type RunResult<T> = Result<T, RunError>;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("Invalid edit for {file}: {reason}")]
    InvalidEdit { file: String, reason: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Config patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Failed to start {executable}: {source}")]
    Spawn {
        executable: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error while running {executable}: {source}")]
    Io {
        executable: PathBuf,
        source: std::io::Error,
    },

    #[error("{executable} exited with {status}")]
    ExecutableFailed {
        executable: PathBuf,
        status: String,
        code: Option<i32>,
        stderr_tail: Vec<String>,
    },

    #[error("Task {index} produced no result")]
    TaskLost { index: usize },

    #[error("Worker pool error: {0}")]
    ThreadPool(String),
}

use std::path::PathBuf;

use hb_patch::PatchError;

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceError {
    #[error("Invalid workspace {path}: {reason}")]
    InvalidWorkspace { path: PathBuf, reason: String },

    #[error("Invalid clone target {path}: {reason}")]
    InvalidTarget { path: PathBuf, reason: String },

    #[error("Unsupported clone option for {path}: {reason}")]
    UnsupportedOption { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Patch(#[from] PatchError),
}

impl WorkspaceError {
    pub(crate) fn io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

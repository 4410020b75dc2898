use std::path::PathBuf;

pub type PatchResult<T> = Result<T, PatchError>;

#[derive(thiserror::Error, Debug)]
pub enum PatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unexpected content in {path} at line {line}: {reason}")]
    FileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] hb_core::CoreError),
}

//! hb-project: the batch file format and its validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_batch};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<BatchDef> {
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let batch = parse_yaml(&content)?;
    Ok(batch)
}

pub fn parse_yaml(content: &str) -> ProjectResult<BatchDef> {
    let batch: BatchDef = serde_yaml::from_str(content)?;
    validate_batch(&batch)?;
    Ok(batch)
}

pub fn save_yaml(path: &std::path::Path, batch: &BatchDef) -> ProjectResult<()> {
    validate_batch(batch)?;
    let content = serde_yaml::to_string(batch)?;
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

use std::path::PathBuf;

pub type TableResult<T> = Result<T, TableError>;

#[derive(thiserror::Error, Debug)]
pub enum TableError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed table {path} at line {line}: {reason}")]
    FileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Column not found: {column}")]
    MissingColumn { column: String },

    #[error("Row not found: {row} (index column '{index}')")]
    MissingRow { row: String, index: String },

    #[error("Table has no index column; cannot address row '{row}'")]
    NoIndex { row: String },
}

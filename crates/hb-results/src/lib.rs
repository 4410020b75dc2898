//! hb-results: persisted batch manifests.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::{compute_batch_id, compute_set_hash};
pub use store::BatchStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Batch not found: {batch_id}")]
    BatchNotFound { batch_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}

/// Current UTC time as RFC 3339, the format manifests are stamped with.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

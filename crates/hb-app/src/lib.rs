//! Shared application service layer for hydrobatch.
//!
//! Front ends only talk to this crate: it loads batch files, compiles them
//! into parameter sets, drives the orchestrator and persists what happened.

pub mod batch_compile;
pub mod batch_service;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod workspace_service;

pub use batch_compile::{apply_setup, compile_set, compile_sets};
pub use batch_service::{
    BatchOptions, BatchRequest, BatchResponse, BatchTimingSummary, execute_batch,
    execute_batch_with_progress, list_batches, load_batch_manifest,
};
pub use error::{AppError, AppResult};
pub use progress::{BatchProgressEvent, BatchStage};
pub use project_service::{SetSummary, list_sets, load_batch, save_batch, validate_batch};
pub use query::{BatchSummary, get_batch_summary};
pub use workspace_service::{SingleRunRequest, open_workspace, run_single};

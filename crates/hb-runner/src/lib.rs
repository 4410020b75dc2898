//! hb-runner: applying parameter sets, driving the model executable and
//! fanning runs out over a worker pool.
//!
//! One run is synchronous end to end: clone, edit, invoke. Parallelism only
//! exists across runs, and every run owns its own cloned directory, so workers
//! share nothing but the read-only source workspace.

pub mod decode;
pub mod edits;
pub mod error;
pub mod executor;
pub mod orchestrator;
mod process;
pub mod runner;

pub use decode::OutputDecoding;
pub use edits::{CellEdit, ParameterEdit, ParameterSet, TemplateEdit};
pub use error::{RunError, RunResult};
pub use executor::{DistributedExecutor, PendingRun, TaskFn, ThreadExecutor};
pub use orchestrator::{
    Backend, Orchestrator, RunTask, TaskOutcome, TaskProgress, clamp_workers,
};
pub use runner::{OutputMode, SimulationRunner};

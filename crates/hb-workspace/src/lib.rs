//! hb-workspace: simulation workspaces and how they are cloned.
//!
//! A workspace is a flat directory holding exactly one model executable plus
//! its configuration and input files. Workspaces are never built from scratch;
//! runs operate on clones of a validated source.

pub mod clone;
pub mod error;
pub mod workspace;

pub use clone::{OUTPUT_SUFFIXES, is_output_artifact};
pub use error::{WorkspaceError, WorkspaceResult};
pub use workspace::{ExecutablePattern, Workspace};

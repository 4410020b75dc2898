//! hb-table: column-addressable access to the model's tabular input files.
//!
//! Input files such as `hydrology.hyd` are whitespace-separated tables with a
//! free-text title line, a header line, an optional units line and one row per
//! object. Runners only rely on the [`TableCodec`] trait, so a different reader
//! can be plugged in without touching the orchestration code.

pub mod codec;
pub mod error;
pub mod table;

pub use codec::{LoadOptions, TableCodec, WhitespaceTableCodec};
pub use error::{TableError, TableResult};
pub use table::{Alignment, Column, Table};

//! hb-core: shared foundation for hydrobatch.
//!
//! Contains:
//! - dates (ISO dates <-> day-of-year/year pairs used by the model's config files)
//! - value (parameter values written into input files)
//! - error (shared error types)

pub mod dates;
pub mod error;
pub mod value;

pub use dates::{DayOfYear, parse_iso_date};
pub use error::{CoreError, CoreResult};
pub use value::ParamValue;

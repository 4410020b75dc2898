//! hb-patch: in-place edits of the model's fixed-format text configuration.
//!
//! - [`print_prt`]: object print frequencies, print window and the CSV switch
//! - [`time_sim`]: simulation start/end window
//! - [`template`]: `#token#` substitution into derived input files
//!
//! Every edit reads the whole file, changes the affected lines and rewrites the
//! whole file. Writes are not atomic: a crash mid-write can leave a truncated
//! file behind.

pub mod error;
mod lines;
pub mod print_prt;
pub mod template;
pub mod time_sim;

pub use error::{PatchError, PatchResult};
pub use print_prt::{
    LineUpdate, PRINT_PRT, PrintFrequency, PrintTimeWindow, format_object_line, object_name,
    read_print_window, set_csv_output, set_print_frequency, set_print_window,
};
pub use template::{apply_template, render_template, template_output_path};
pub use time_sim::{SimulationTimeWindow, TIME_SIM, read_simulation_window, set_simulation_window};

//! Simulation window in `time.sim` (line 3: `day_start yrc_start day_end yrc_end step`).

use std::path::Path;

use hb_core::DayOfYear;
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::lines::{fixed_line, int_fields, read_lines, write_lines};

pub const TIME_SIM: &str = "time.sim";

const WINDOW_LINE: usize = 3;
const WINDOW_FIELDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTimeWindow {
    pub start: DayOfYear,
    pub end: DayOfYear,
    pub step: u32,
}

impl SimulationTimeWindow {
    pub fn from_iso(start: &str, end: &str, step: u32) -> PatchResult<Self> {
        Ok(Self {
            start: DayOfYear::parse_iso(start)?,
            end: DayOfYear::parse_iso(end)?,
            step,
        })
    }

    /// Five right-justified fields (8, 10, 10, 10, 10), each followed by a space.
    pub fn format_line(&self) -> String {
        format!(
            "{:>8} {:>10} {:>10} {:>10} {:>10} \n",
            self.start.day, self.start.year, self.end.day, self.end.year, self.step
        )
    }
}

/// Rewrite line 3 of `time.sim`. The whole file is rewritten.
pub fn set_simulation_window(path: &Path, window: &SimulationTimeWindow) -> PatchResult<()> {
    let mut lines = read_lines(path)?;
    let line = fixed_line(&mut lines, WINDOW_LINE, WINDOW_FIELDS, path)?;
    *line = window.format_line();
    write_lines(path, &lines)?;
    debug!(path = %path.display(), ?window, "simulation window set");
    Ok(())
}

pub fn read_simulation_window(path: &Path) -> PatchResult<SimulationTimeWindow> {
    let mut lines = read_lines(path)?;
    let line = fixed_line(&mut lines, WINDOW_LINE, WINDOW_FIELDS, path)?;
    let values = int_fields(line, WINDOW_FIELDS, WINDOW_LINE, path)?;

    let out_of_range = |value: i64| PatchError::FileFormat {
        path: path.to_path_buf(),
        line: WINDOW_LINE,
        reason: format!("{} is out of range", value),
    };
    let day = |value: i64| u32::try_from(value).map_err(|_| out_of_range(value));
    let year = |value: i64| i32::try_from(value).map_err(|_| out_of_range(value));

    Ok(SimulationTimeWindow {
        start: DayOfYear {
            day: day(values[0])?,
            year: year(values[1])?,
        },
        end: DayOfYear {
            day: day(values[2])?,
            year: year(values[3])?,
        },
        step: day(values[4])?,
    })
}

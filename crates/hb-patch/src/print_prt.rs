//! Edits to `print.prt`, the model's output-control file.
//!
//! Layout relied on:
//! - line 3: `nyskip day_start yrc_start day_end yrc_end interval`
//! - line 7: CSV output switch in the first column
//! - object table: one line per object, `name daily monthly yearly avann`

use std::path::Path;

use hb_core::DayOfYear;
use tracing::debug;

use crate::error::{PatchError, PatchResult};
use crate::lines::{fixed_line, int_fields, read_lines, write_lines};

pub const PRINT_PRT: &str = "print.prt";

const OBJECT_WIDTH: usize = 29;
const FLAG_WIDTH: usize = 14;
const WINDOW_LINE: usize = 3;
const WINDOW_FIELDS: usize = 6;
const CSV_LINE: usize = 7;

/// Output periodicity flags of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintFrequency {
    pub daily: bool,
    pub monthly: bool,
    pub yearly: bool,
    pub avann: bool,
}

impl PrintFrequency {
    pub fn new(daily: bool, monthly: bool, yearly: bool, avann: bool) -> Self {
        Self {
            daily,
            monthly,
            yearly,
            avann,
        }
    }

    fn flags(self) -> [bool; 4] {
        [self.daily, self.monthly, self.yearly, self.avann]
    }
}

/// Where an object line ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineUpdate {
    /// 1-based line number of the replaced line.
    Replaced { line: usize },
    /// 1-based line number of the appended line.
    Appended { line: usize },
}

/// Canonical object name for a token.
///
/// Output file names such as `channel_sd_day.txt` map back to their object
/// (`channel_sd`) by dropping the trailing `_<suffix>` segment.
pub fn object_name(token: &str) -> &str {
    if Path::new(token).extension().is_some() {
        token.rsplit_once('_').map_or(token, |(head, _)| head)
    } else {
        token
    }
}

/// Fixed-column object line: name in 29 columns, then four 14-column flags.
pub fn format_object_line(name: &str, frequency: PrintFrequency) -> String {
    let mut line = format!("{:<OBJECT_WIDTH$}", name);
    for flag in frequency.flags() {
        let flag = if flag { "y" } else { "n" };
        line.push_str(&format!("{:<FLAG_WIDTH$}", flag));
    }
    let mut line = line.trim_end().to_string();
    line.push('\n');
    line
}

fn names_object(line: &str, name: &str) -> bool {
    line.strip_prefix(name)
        .is_some_and(|rest| rest.chars().next().is_none_or(char::is_whitespace))
}

/// Enable or update an object's print frequencies.
///
/// A line belongs to the object only when the name is followed by whitespace,
/// so `basin` never touches `basin_sub`. Unknown objects are appended.
/// The whole file is rewritten.
pub fn set_print_frequency(
    path: &Path,
    object: &str,
    frequency: PrintFrequency,
) -> PatchResult<LineUpdate> {
    let name = object_name(object);
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(PatchError::InvalidInput(format!(
            "invalid print object name '{}'",
            object
        )));
    }

    let mut lines = read_lines(path)?;
    let replacement = format_object_line(name, frequency);

    let mut first_match = None;
    for (pos, line) in lines.iter_mut().enumerate() {
        if names_object(line, name) {
            *line = replacement.clone();
            first_match.get_or_insert(pos + 1);
        }
    }

    let update = match first_match {
        Some(line) => LineUpdate::Replaced { line },
        None => {
            if let Some(last) = lines.last_mut()
                && !last.ends_with('\n')
            {
                last.push('\n');
            }
            lines.push(replacement);
            LineUpdate::Appended { line: lines.len() }
        }
    };

    write_lines(path, &lines)?;
    debug!(path = %path.display(), object = name, ?update, "print frequency set");
    Ok(update)
}

/// Switch CSV output on or off (first character of line 7).
pub fn set_csv_output(path: &Path, enable: bool) -> PatchResult<()> {
    let mut lines = read_lines(path)?;
    let line = fixed_line(&mut lines, CSV_LINE, 1, path)?;

    let flag = if enable { 'y' } else { 'n' };
    let rest = match line.chars().next() {
        Some(c) if c != '\n' && c != '\r' => line[c.len_utf8()..].to_string(),
        _ => line.clone(),
    };
    *line = format!("{}{}", flag, rest);

    write_lines(path, &lines)?;
    debug!(path = %path.display(), enable, "csv output set");
    Ok(())
}

/// Print window on line 3 of `print.prt`.
///
/// Either years are skipped (`window == None`, the four date fields are zero)
/// or an explicit window is printed. The two modes never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintTimeWindow {
    pub warmup: u32,
    pub window: Option<(DayOfYear, DayOfYear)>,
    pub interval: u32,
}

impl PrintTimeWindow {
    pub fn skip_years(warmup: u32, interval: u32) -> Self {
        Self {
            warmup,
            window: None,
            interval,
        }
    }

    pub fn explicit(warmup: u32, start: DayOfYear, end: DayOfYear, interval: u32) -> Self {
        Self {
            warmup,
            window: Some((start, end)),
            interval,
        }
    }

    /// Build from optional ISO dates. Both or neither must be given.
    pub fn from_iso(
        start: Option<&str>,
        end: Option<&str>,
        warmup: u32,
        interval: u32,
    ) -> PatchResult<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self::explicit(
                warmup,
                DayOfYear::parse_iso(start)?,
                DayOfYear::parse_iso(end)?,
                interval,
            )),
            (None, None) => Ok(Self::skip_years(warmup, interval)),
            _ => Err(PatchError::InvalidInput(
                "print window needs both a start and an end date".to_string(),
            )),
        }
    }

    pub fn format_line(&self) -> String {
        let (day_start, year_start, day_end, year_end) = match self.window {
            Some((start, end)) => (start.day, start.year, end.day, end.year),
            None => (0, 0, 0, 0),
        };
        format!(
            "{:<12} {:<11} {:<11} {:<10} {:<10} {:<10} \n",
            self.warmup, day_start, year_start, day_end, year_end, self.interval
        )
    }
}

/// Rewrite line 3 of `print.prt`.
pub fn set_print_window(path: &Path, window: &PrintTimeWindow) -> PatchResult<()> {
    let mut lines = read_lines(path)?;
    let line = fixed_line(&mut lines, WINDOW_LINE, WINDOW_FIELDS, path)?;
    *line = window.format_line();
    write_lines(path, &lines)?;
    debug!(path = %path.display(), ?window, "print window set");
    Ok(())
}

pub fn read_print_window(path: &Path) -> PatchResult<PrintTimeWindow> {
    let mut lines = read_lines(path)?;
    let line = fixed_line(&mut lines, WINDOW_LINE, WINDOW_FIELDS, path)?;
    let values = int_fields(line, WINDOW_FIELDS, WINDOW_LINE, path)?;

    let out_of_range = |value: i64| PatchError::FileFormat {
        path: path.to_path_buf(),
        line: WINDOW_LINE,
        reason: format!("{} is out of range", value),
    };
    let field = |value: i64| u32::try_from(value).map_err(|_| out_of_range(value));
    let year = |value: i64| i32::try_from(value).map_err(|_| out_of_range(value));

    let window = if values[1..5].iter().all(|v| *v == 0) {
        None
    } else {
        Some((
            DayOfYear {
                day: field(values[1])?,
                year: year(values[2])?,
            },
            DayOfYear {
                day: field(values[3])?,
                year: year(values[4])?,
            },
        ))
    };

    Ok(PrintTimeWindow {
        warmup: field(values[0])?,
        window,
        interval: field(values[5])?,
    })
}

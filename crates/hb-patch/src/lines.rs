//! Line-preserving file access shared by the patchers.

use std::fs;
use std::path::Path;

use crate::error::{PatchError, PatchResult};

/// Read a file as lines that keep their terminators, so untouched lines are
/// written back byte for byte.
pub(crate) fn read_lines(path: &Path) -> PatchResult<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

pub(crate) fn write_lines(path: &Path, lines: &[String]) -> PatchResult<()> {
    fs::write(path, lines.concat()).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Borrow 1-based line `nth`, checking it carries at least `min_fields` fields.
pub(crate) fn fixed_line<'a>(
    lines: &'a mut [String],
    nth: usize,
    min_fields: usize,
    path: &Path,
) -> PatchResult<&'a mut String> {
    let total = lines.len();
    let line = lines.get_mut(nth - 1).ok_or_else(|| PatchError::FileFormat {
        path: path.to_path_buf(),
        line: nth,
        reason: format!("file has only {} lines", total),
    })?;
    let fields = line.split_whitespace().count();
    if fields < min_fields {
        return Err(PatchError::FileFormat {
            path: path.to_path_buf(),
            line: nth,
            reason: format!("expected at least {} fields, found {}", min_fields, fields),
        });
    }
    Ok(line)
}

/// Parse the first `count` whitespace fields of a line as integers.
pub(crate) fn int_fields(line: &str, count: usize, nth: usize, path: &Path) -> PatchResult<Vec<i64>> {
    line.split_whitespace()
        .take(count)
        .map(|field| {
            field.parse::<i64>().map_err(|_| PatchError::FileFormat {
                path: path.to_path_buf(),
                line: nth,
                reason: format!("'{}' is not an integer", field),
            })
        })
        .collect()
}

//! Target preparation and file copying for workspace clones.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{WorkspaceError, WorkspaceResult};

/// Name suffixes of simulation output files. A fresh clone must not carry
/// results of a previous run.
pub const OUTPUT_SUFFIXES: [&str; 8] = [
    "_aa.txt", "_aa.csv", "_yr.txt", "_yr.csv", "_day.txt", "_day.csv", "_mon.txt", "_mon.csv",
];

const RUN_DIR_PREFIX: &str = "run-";
const UNIQUE_DIR_ATTEMPTS: usize = 16;

pub fn is_output_artifact(file_name: &str) -> bool {
    OUTPUT_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// Resolve (and create or clear) the directory a clone is copied into.
pub(crate) fn prepare_target(
    source: &Path,
    target: Option<&Path>,
    overwrite: bool,
) -> WorkspaceResult<PathBuf> {
    let dir = match (target, overwrite) {
        (None, _) => return create_unique_dir(&std::env::temp_dir()),
        (Some(dir), false) => return create_unique_dir(dir),
        (Some(dir), true) => dir,
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            if same_directory(source, dir) {
                return Err(WorkspaceError::InvalidTarget {
                    path: dir.to_path_buf(),
                    reason: "target is the source workspace".to_string(),
                });
            }
            let removed = clear_files(dir)?;
            debug!(target = %dir.display(), removed, "cleared overwrite target");
            Ok(dir.to_path_buf())
        }
        Ok(meta) if meta.is_file() => Err(WorkspaceError::InvalidTarget {
            path: dir.to_path_buf(),
            reason: "target must be a directory, found a file".to_string(),
        }),
        Ok(_) => Err(WorkspaceError::UnsupportedOption {
            path: dir.to_path_buf(),
            reason: "target is neither a file nor a directory".to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(WorkspaceError::io(dir))?;
            Ok(dir.to_path_buf())
        }
        Err(e) => Err(WorkspaceError::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn create_unique_dir(parent: &Path) -> WorkspaceResult<PathBuf> {
    if parent.is_file() {
        return Err(WorkspaceError::InvalidTarget {
            path: parent.to_path_buf(),
            reason: "target must be a directory, found a file".to_string(),
        });
    }
    fs::create_dir_all(parent).map_err(WorkspaceError::io(parent))?;

    for _ in 0..UNIQUE_DIR_ATTEMPTS {
        let candidate = parent.join(format!("{}{}", RUN_DIR_PREFIX, Uuid::new_v4().simple()));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(WorkspaceError::Io {
                    path: candidate,
                    source: e,
                });
            }
        }
    }

    Err(WorkspaceError::InvalidTarget {
        path: parent.to_path_buf(),
        reason: "could not create a unique run directory".to_string(),
    })
}

/// Delete regular files directly inside `dir`. Subdirectories are kept.
/// Individual failures are logged and skipped.
fn clear_files(dir: &Path) -> WorkspaceResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(WorkspaceError::io(dir))? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = %path.display(), error = %e, "could not delete stale file"),
        }
    }
    Ok(removed)
}

/// Copy top-level regular files, skipping simulation outputs.
pub(crate) fn copy_inputs(source: &Path, target: &Path) -> WorkspaceResult<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(source).map_err(WorkspaceError::io(source))? {
        let entry = entry.map_err(WorkspaceError::io(source))?;
        let path = entry.path();
        let name = entry.file_name();

        if !path.is_file() {
            debug!(entry = %path.display(), "not a regular file, skipped");
            continue;
        }
        if name.to_str().is_some_and(is_output_artifact) {
            debug!(file = %path.display(), "output artifact, skipped");
            continue;
        }

        let destination = target.join(&name);
        fs::copy(&path, &destination).map_err(WorkspaceError::io(&destination))?;
        copied += 1;
    }
    Ok(copied)
}

//! Validated workspace handle.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use hb_patch::{
    LineUpdate, PRINT_PRT, PrintFrequency, PrintTimeWindow, SimulationTimeWindow, TIME_SIM,
};
use indexmap::IndexMap;
use tracing::info;

use crate::clone::{copy_inputs, prepare_target};
use crate::error::{WorkspaceError, WorkspaceResult};

/// Which file in a workspace is the model executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePattern {
    suffix: String,
}

impl ExecutablePattern {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn as_suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() > self.suffix.len() && file_name.ends_with(&self.suffix)
    }
}

impl Default for ExecutablePattern {
    fn default() -> Self {
        Self::suffix(".exe")
    }
}

/// A directory with exactly one executable. Each value owns its own paths, so
/// clones can be driven from different threads independently.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    executable: PathBuf,
    pattern: ExecutablePattern,
}

impl Workspace {
    pub fn open(root: impl AsRef<Path>) -> WorkspaceResult<Self> {
        Self::open_with(root, ExecutablePattern::default())
    }

    pub fn open_with(root: impl AsRef<Path>, pattern: ExecutablePattern) -> WorkspaceResult<Self> {
        let root = root.as_ref();
        let invalid = |reason: String| WorkspaceError::InvalidWorkspace {
            path: root.to_path_buf(),
            reason,
        };

        if !root.is_dir() {
            return Err(invalid("folder does not exist".to_string()));
        }

        let mut executables = Vec::new();
        for entry in fs::read_dir(root).map_err(WorkspaceError::io(root))? {
            let entry = entry.map_err(WorkspaceError::io(root))?;
            let path = entry.path();
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches(name));
            if matches && path.is_file() {
                executables.push(path);
            }
        }
        executables.sort();

        match executables.len() {
            0 => Err(invalid(format!(
                "no executable matching '*{}' found",
                pattern.as_suffix()
            ))),
            1 => Ok(Self {
                root: root.to_path_buf(),
                executable: executables.remove(0),
                pattern,
            }),
            n => Err(invalid(format!(
                "{} executables matching '*{}' found, expected exactly one",
                n,
                pattern.as_suffix()
            ))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn pattern(&self) -> &ExecutablePattern {
        &self.pattern
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn print_prt(&self) -> PathBuf {
        self.file(PRINT_PRT)
    }

    pub fn time_sim(&self) -> PathBuf {
        self.file(TIME_SIM)
    }

    /// Copy this workspace's inputs and return the target directory.
    ///
    /// - no target, or `overwrite == false`: a fresh uniquely named directory
    ///   under the target (or the system temp dir) is created
    /// - `overwrite == true`: the target's top-level files are deleted and the
    ///   inputs copied into it; a missing target is created
    ///
    /// Simulation output files (`*_day.txt`, `*_aa.csv`, ...) are never copied.
    pub fn clone_to(&self, target: Option<&Path>, overwrite: bool) -> WorkspaceResult<PathBuf> {
        let destination = prepare_target(&self.root, target, overwrite)?;
        let copied = copy_inputs(&self.root, &destination)?;
        info!(
            source = %self.root.display(),
            target = %destination.display(),
            files = copied,
            "workspace cloned"
        );
        Ok(destination)
    }

    /// [`Workspace::clone_to`], reopened as a workspace.
    pub fn clone_workspace(&self, target: Option<&Path>, overwrite: bool) -> WorkspaceResult<Self> {
        let destination = self.clone_to(target, overwrite)?;
        Self::open_with(destination, self.pattern.clone())
    }

    pub fn set_print_frequency(
        &self,
        object: &str,
        frequency: PrintFrequency,
    ) -> WorkspaceResult<LineUpdate> {
        Ok(hb_patch::set_print_frequency(
            &self.print_prt(),
            object,
            frequency,
        )?)
    }

    pub fn enable_csv_print(&self) -> WorkspaceResult<()> {
        Ok(hb_patch::set_csv_output(&self.print_prt(), true)?)
    }

    pub fn disable_csv_print(&self) -> WorkspaceResult<()> {
        Ok(hb_patch::set_csv_output(&self.print_prt(), false)?)
    }

    pub fn set_simulation_window(&self, window: &SimulationTimeWindow) -> WorkspaceResult<()> {
        Ok(hb_patch::set_simulation_window(&self.time_sim(), window)?)
    }

    pub fn set_print_window(&self, window: &PrintTimeWindow) -> WorkspaceResult<()> {
        Ok(hb_patch::set_print_window(&self.print_prt(), window)?)
    }

    /// Render `template` (a file name inside the workspace).
    pub fn apply_template<V: Display>(
        &self,
        template: &str,
        tokens: &IndexMap<String, V>,
    ) -> WorkspaceResult<PathBuf> {
        Ok(hb_patch::apply_template(&self.file(template), tokens)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_requires_a_stem() {
        let pattern = ExecutablePattern::default();
        assert!(pattern.matches("swatplus.exe"));
        assert!(!pattern.matches(".exe"));
        assert!(!pattern.matches("swatplus.exe.bak"));
    }
}

//! One simulation: edit the workspace's inputs, then invoke its executable.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use hb_table::{TableCodec, WhitespaceTableCodec};
use hb_workspace::Workspace;
use tracing::{debug, info};

use crate::decode::OutputDecoding;
use crate::edits::{ParameterEdit, ParameterSet};
use crate::error::RunResult;
use crate::process::run_executable;

/// Where executable output lines go.
pub enum OutputMode<'a> {
    /// Discard.
    Quiet,
    /// Emit each line as a `tracing` event.
    Log,
    /// Hand each line to the caller as soon as it is read.
    Show(&'a mut dyn FnMut(&str)),
}

#[derive(Clone)]
pub struct SimulationRunner {
    codec: Arc<dyn TableCodec>,
    decoding: OutputDecoding,
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self {
            codec: Arc::new(WhitespaceTableCodec),
            decoding: OutputDecoding::default(),
        }
    }
}

impl fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("decoding", &self.decoding)
            .finish_non_exhaustive()
    }
}

impl SimulationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: Arc<dyn TableCodec>) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }

    pub fn with_decoding(mut self, decoding: OutputDecoding) -> Self {
        self.decoding = decoding;
        self
    }

    pub fn decoding(&self) -> OutputDecoding {
        self.decoding
    }

    /// Apply every edit of `set` to `workspace`, tables first, then templates.
    ///
    /// The whole set is validated before any file is touched.
    pub fn apply_parameters(&self, workspace: &Workspace, set: &ParameterSet) -> RunResult<()> {
        set.validate()?;
        for edit in &set.parameters {
            self.apply_table_edit(workspace, edit)?;
        }
        for template in &set.templates {
            workspace.apply_template(&template.template, &template.tokens)?;
        }
        Ok(())
    }

    fn apply_table_edit(&self, workspace: &Workspace, edit: &ParameterEdit) -> RunResult<()> {
        let path = workspace.file(&edit.file);
        let mut table = self.codec.load(&path, &edit.load_options())?;
        for cell in &edit.edits {
            match &cell.row {
                Some(row) => {
                    table.set(row, &cell.column, &cell.value)?;
                }
                None => table.set_column(&cell.column, &cell.value)?,
            }
        }
        self.codec.save(&table, &path)?;
        debug!(file = %path.display(), edits = edit.edits.len(), "table edited");
        Ok(())
    }

    /// Run the workspace's executable inside the workspace directory and
    /// block until it exits. Returns the workspace path.
    pub fn invoke(&self, workspace: &Workspace, output: OutputMode<'_>) -> RunResult<PathBuf> {
        info!(workspace = %workspace.root().display(), "invoking executable");
        let executable = workspace.executable();
        let root = workspace.root();
        let finished = match output {
            OutputMode::Quiet => run_executable(executable, root, self.decoding, &mut |_: &str| {}),
            OutputMode::Log => run_executable(executable, root, self.decoding, &mut |line: &str| {
                info!(target: "hb_runner::output", "{line}")
            }),
            OutputMode::Show(sink) => run_executable(executable, root, self.decoding, sink),
        };
        finished?;
        Ok(root.to_path_buf())
    }

    /// Apply `set` and invoke, returning the workspace path.
    pub fn run(
        &self,
        workspace: &Workspace,
        set: &ParameterSet,
        output: OutputMode<'_>,
    ) -> RunResult<PathBuf> {
        self.apply_parameters(workspace, set)?;
        self.invoke(workspace, output)
    }
}

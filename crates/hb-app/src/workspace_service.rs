//! Single-workspace operations: open, clone, patch and run one simulation.

use std::path::{Path, PathBuf};

use hb_core::ParamValue;
use hb_patch::{LineUpdate, PrintFrequency, PrintTimeWindow, SimulationTimeWindow};
use hb_runner::{Orchestrator, OutputMode, ParameterSet, SimulationRunner};
use hb_workspace::{ExecutablePattern, Workspace};
use indexmap::IndexMap;

use crate::error::AppResult;

pub fn open_workspace(path: &Path, executable_suffix: Option<&str>) -> AppResult<Workspace> {
    let pattern = executable_suffix
        .map(ExecutablePattern::suffix)
        .unwrap_or_default();
    Ok(Workspace::open_with(path, pattern)?)
}

pub fn clone_workspace(
    workspace: &Workspace,
    target: Option<&Path>,
    overwrite: bool,
) -> AppResult<PathBuf> {
    Ok(workspace.clone_to(target, overwrite)?)
}

pub fn set_print_object(
    workspace: &Workspace,
    object: &str,
    frequency: PrintFrequency,
) -> AppResult<LineUpdate> {
    Ok(workspace.set_print_frequency(object, frequency)?)
}

pub fn set_csv_output(workspace: &Workspace, enable: bool) -> AppResult<()> {
    if enable {
        workspace.enable_csv_print()?;
    } else {
        workspace.disable_csv_print()?;
    }
    Ok(())
}

pub fn set_simulation_window(
    workspace: &Workspace,
    start: &str,
    end: &str,
    step: u32,
) -> AppResult<SimulationTimeWindow> {
    let window = SimulationTimeWindow::from_iso(start, end, step)?;
    workspace.set_simulation_window(&window)?;
    Ok(window)
}

pub fn simulation_window(workspace: &Workspace) -> AppResult<SimulationTimeWindow> {
    Ok(hb_patch::read_simulation_window(&workspace.time_sim())?)
}

pub fn print_window(workspace: &Workspace) -> AppResult<PrintTimeWindow> {
    Ok(hb_patch::read_print_window(&workspace.print_prt())?)
}

pub fn set_print_window(
    workspace: &Workspace,
    start: Option<&str>,
    end: Option<&str>,
    warmup: u32,
    interval: u32,
) -> AppResult<PrintTimeWindow> {
    let window = PrintTimeWindow::from_iso(start, end, warmup, interval)?;
    workspace.set_print_window(&window)?;
    Ok(window)
}

pub fn apply_template(
    workspace: &Workspace,
    template: &str,
    tokens: &IndexMap<String, ParamValue>,
) -> AppResult<PathBuf> {
    Ok(workspace.apply_template(template, tokens)?)
}

/// One run of a workspace outside any batch.
#[derive(Debug, Clone)]
pub struct SingleRunRequest<'a> {
    pub workspace: &'a Path,
    pub executable_suffix: Option<&'a str>,
    /// Clone into this directory first; run in place when `None`.
    pub target: Option<&'a Path>,
    pub overwrite: bool,
    pub set: ParameterSet,
}

/// Run one simulation; `on_line` receives output lines, `None` discards them.
/// Returns the directory the simulation ran in.
pub fn run_single(
    request: &SingleRunRequest<'_>,
    on_line: Option<&mut dyn FnMut(&str)>,
) -> AppResult<PathBuf> {
    let source = open_workspace(request.workspace, request.executable_suffix)?;
    let output = match on_line {
        Some(sink) => OutputMode::Show(sink),
        None => OutputMode::Quiet,
    };

    let path = match request.target {
        Some(target) => Orchestrator::new(source).run_one(
            Some(target),
            request.overwrite,
            &request.set,
            output,
        )?,
        None => SimulationRunner::new().run(&source, &request.set, output)?,
    };
    Ok(path)
}

//! Batch definitions to runner inputs.

use hb_patch::{PrintFrequency, PrintTimeWindow, SimulationTimeWindow};
use hb_project::{BatchDef, ParameterSetDef, SetupDef};
use hb_runner::{CellEdit, ParameterEdit, ParameterSet, TemplateEdit};
use hb_workspace::Workspace;
use tracing::info;

use crate::error::AppResult;

pub fn compile_set(def: &ParameterSetDef) -> ParameterSet {
    ParameterSet {
        parameters: def
            .parameters
            .iter()
            .map(|p| ParameterEdit {
                file: p.file.clone(),
                index: p.index.clone(),
                has_units: p.has_units,
                edits: p
                    .edits
                    .iter()
                    .map(|e| CellEdit {
                        row: e.row.clone(),
                        column: e.column.clone(),
                        value: e.value.clone(),
                    })
                    .collect(),
            })
            .collect(),
        templates: def
            .templates
            .iter()
            .map(|t| TemplateEdit {
                template: t.template.clone(),
                tokens: t.tokens.clone(),
            })
            .collect(),
    }
}

pub fn compile_sets(batch: &BatchDef) -> Vec<ParameterSet> {
    batch.sets.iter().map(compile_set).collect()
}

/// Apply the one-off setup to `workspace`. Returns how many files were patched.
pub fn apply_setup(workspace: &Workspace, setup: &SetupDef) -> AppResult<usize> {
    let mut patched = 0;

    if let Some(simulation) = &setup.simulation {
        let window =
            SimulationTimeWindow::from_iso(&simulation.start, &simulation.end, simulation.step)?;
        workspace.set_simulation_window(&window)?;
        patched += 1;
    }

    if let Some(print) = &setup.print_window {
        let window = PrintTimeWindow::from_iso(
            print.start.as_deref(),
            print.end.as_deref(),
            print.warmup,
            print.interval,
        )?;
        workspace.set_print_window(&window)?;
        patched += 1;
    }

    match setup.csv_output {
        Some(true) => {
            workspace.enable_csv_print()?;
            patched += 1;
        }
        Some(false) => {
            workspace.disable_csv_print()?;
            patched += 1;
        }
        None => {}
    }

    for object in &setup.print_objects {
        let frequency =
            PrintFrequency::new(object.daily, object.monthly, object.yearly, object.avann);
        workspace.set_print_frequency(&object.name, frequency)?;
        patched += 1;
    }

    info!(workspace = %workspace.root().display(), patched, "setup applied");
    Ok(patched)
}

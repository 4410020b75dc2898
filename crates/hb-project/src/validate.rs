//! Batch validation logic.

use std::collections::HashSet;

use hb_core::DayOfYear;

use crate::schema::{BatchDef, ParameterSetDef, SetupDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Empty name in {context}")]
    EmptyName { context: String },

    #[error("Set {set}: row '{row}' of {file} targeted without an index column")]
    MissingIndex {
        set: String,
        file: String,
        row: String,
    },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn require_name(name: &str, context: impl Into<String>) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName {
            context: context.into(),
        });
    }
    Ok(())
}

fn check_date(field: &str, value: &str) -> Result<(), ValidationError> {
    DayOfYear::parse_iso(value)
        .map(|_| ())
        .map_err(|err| invalid(field, value, err.to_string()))
}

pub fn validate_batch(batch: &BatchDef) -> Result<(), ValidationError> {
    if batch.version == 0 || batch.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: batch.version,
        });
    }
    require_name(&batch.name, "batch name")?;
    if batch.workspace.as_os_str().is_empty() {
        return Err(invalid("workspace", "", "workspace path is required"));
    }
    if batch.workers == 0 {
        return Err(invalid("workers", 0, "at least one worker is required"));
    }
    if let Some(suffix) = &batch.executable_suffix {
        require_name(suffix, "executable_suffix")?;
    }
    if let Some(setup) = &batch.setup {
        validate_setup(setup)?;
    }

    if batch.sets.is_empty() {
        return Err(invalid("sets", 0, "at least one parameter set is required"));
    }
    let mut names = HashSet::new();
    for set in &batch.sets {
        require_name(&set.name, "set name")?;
        if !names.insert(set.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: set.name.clone(),
                context: "sets".to_string(),
            });
        }
        validate_set(set)?;
    }
    Ok(())
}

fn validate_setup(setup: &SetupDef) -> Result<(), ValidationError> {
    if let Some(simulation) = &setup.simulation {
        check_date("setup.simulation.start", &simulation.start)?;
        check_date("setup.simulation.end", &simulation.end)?;
    }

    if let Some(window) = &setup.print_window {
        match (&window.start, &window.end) {
            (Some(start), Some(end)) => {
                check_date("setup.print_window.start", start)?;
                check_date("setup.print_window.end", end)?;
            }
            (None, None) => {}
            (Some(date), None) | (None, Some(date)) => {
                return Err(invalid(
                    "setup.print_window",
                    date,
                    "start and end must be given together",
                ));
            }
        }
    }

    let mut objects = HashSet::new();
    for object in &setup.print_objects {
        require_name(&object.name, "setup.print_objects")?;
        if !objects.insert(object.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: object.name.clone(),
                context: "setup.print_objects".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_set(set: &ParameterSetDef) -> Result<(), ValidationError> {
    let context = |what: &str| format!("set '{}' {}", set.name, what);

    for edit in &set.parameters {
        require_name(&edit.file, context("parameter file"))?;
        if edit.edits.is_empty() {
            return Err(invalid(
                &context("parameters"),
                &edit.file,
                "no edits given",
            ));
        }
        for cell in &edit.edits {
            require_name(&cell.column, context("column"))?;
            if let (Some(row), None) = (&cell.row, &edit.index) {
                return Err(ValidationError::MissingIndex {
                    set: set.name.clone(),
                    file: edit.file.clone(),
                    row: row.clone(),
                });
            }
        }
    }

    for template in &set.templates {
        require_name(&template.template, context("template"))?;
        for token in template.tokens.keys() {
            require_name(token, context("template token"))?;
        }
    }
    Ok(())
}

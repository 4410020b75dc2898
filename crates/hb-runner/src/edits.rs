//! Parameter sets: the per-run edits applied to a cloned workspace.

use hb_core::ParamValue;
use hb_table::LoadOptions;
use indexmap::IndexMap;

use crate::error::{RunError, RunResult};

/// One cell assignment. Without a row the whole column is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row: Option<String>,
    pub column: String,
    pub value: ParamValue,
}

impl CellEdit {
    pub fn column(column: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            row: None,
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn cell(
        row: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self {
            row: Some(row.into()),
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Edits against one tabular input file of the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEdit {
    /// File name inside the workspace, e.g. `hydrology.hyd`.
    pub file: String,
    /// Column used to address rows; required by row-targeted edits.
    pub index: Option<String>,
    pub has_units: bool,
    pub edits: Vec<CellEdit>,
}

impl ParameterEdit {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            index: None,
            has_units: false,
            edits: Vec::new(),
        }
    }

    pub fn indexed(file: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..Self::new(file)
        }
    }

    pub fn with_units(mut self) -> Self {
        self.has_units = true;
        self
    }

    pub fn set_column(mut self, column: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.edits.push(CellEdit::column(column, value));
        self
    }

    pub fn set_cell(
        mut self,
        row: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.edits.push(CellEdit::cell(row, column, value));
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            has_units: self.has_units,
            index: self.index.clone(),
            ..LoadOptions::default()
        }
    }

    pub fn validate(&self) -> RunResult<()> {
        validate_file_name(&self.file)?;
        if self.edits.is_empty() {
            return Err(invalid(&self.file, "no edits given"));
        }
        for edit in &self.edits {
            if edit.column.trim().is_empty() {
                return Err(invalid(&self.file, "empty column name"));
            }
            if edit.row.is_some() && self.index.is_none() {
                return Err(invalid(
                    &self.file,
                    format!(
                        "row '{}' targeted without an index column",
                        edit.row.as_deref().unwrap_or_default()
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Token values for one `*.tpl`-style template inside the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEdit {
    pub template: String,
    pub tokens: IndexMap<String, ParamValue>,
}

impl TemplateEdit {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            tokens: IndexMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.tokens.insert(token.into(), value.into());
        self
    }

    pub fn validate(&self) -> RunResult<()> {
        validate_file_name(&self.template)?;
        if !self.template.contains('.') {
            return Err(invalid(&self.template, "template name has no suffix"));
        }
        if self.tokens.keys().any(|token| token.is_empty() || token.contains('#')) {
            return Err(invalid(&self.template, "tokens must be non-empty and free of '#'"));
        }
        Ok(())
    }
}

/// Everything that distinguishes one run from another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    pub parameters: Vec<ParameterEdit>,
    pub templates: Vec<TemplateEdit>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, edit: ParameterEdit) -> Self {
        self.parameters.push(edit);
        self
    }

    pub fn with_template(mut self, edit: TemplateEdit) -> Self {
        self.templates.push(edit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.templates.is_empty()
    }

    pub fn validate(&self) -> RunResult<()> {
        for edit in &self.parameters {
            edit.validate()?;
        }
        for edit in &self.templates {
            edit.validate()?;
        }
        Ok(())
    }
}

fn invalid(file: &str, reason: impl Into<String>) -> RunError {
    RunError::InvalidEdit {
        file: file.to_string(),
        reason: reason.into(),
    }
}

/// Edits address files by bare name so they can never leave the workspace.
fn validate_file_name(name: &str) -> RunResult<()> {
    if name.trim().is_empty() {
        return Err(invalid(name, "empty file name"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(invalid(name, "expected a file name inside the workspace"));
    }
    Ok(())
}

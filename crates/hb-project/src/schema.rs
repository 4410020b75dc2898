//! Batch schema definitions.

use std::path::PathBuf;

use hb_core::ParamValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_workers() -> usize {
    1
}

fn default_interval() -> u32 {
    1
}

/// A batch: one source workspace, optional one-off setup, many parameter sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchDef {
    pub version: u32,
    pub name: String,
    /// Source workspace, relative to the batch file.
    pub workspace: PathBuf,
    /// Parent of the per-run directories, relative to the batch file. The
    /// system temp dir when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SetupDef>,
    #[serde(default)]
    pub sets: Vec<ParameterSetDef>,
}

/// Changes applied once to the source workspace before any run is cloned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SetupDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationWindowDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_window: Option<PrintWindowDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_output: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub print_objects: Vec<PrintObjectDef>,
}

/// `time.sim` window; dates are ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationWindowDef {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub step: u32,
}

/// `print.prt` window. Give both dates or neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintWindowDef {
    #[serde(default)]
    pub warmup: u32,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintObjectDef {
    pub name: String,
    #[serde(default)]
    pub daily: bool,
    #[serde(default)]
    pub monthly: bool,
    #[serde(default)]
    pub yearly: bool,
    #[serde(default)]
    pub avann: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSetDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterEditDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateEditDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterEditDef {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_units: bool,
    pub edits: Vec<CellEditDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellEditDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<String>,
    pub column: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateEditDef {
    pub template: String,
    #[serde(default)]
    pub tokens: IndexMap<String, ParamValue>,
}

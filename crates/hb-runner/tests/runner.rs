#![cfg(unix)]

mod common;

use std::fs;

use common::{FAILING_SCRIPT, HYD, MODEL_SCRIPT, build_txtinout};
use hb_runner::{
    OutputDecoding, OutputMode, ParameterEdit, ParameterSet, RunError, SimulationRunner,
    TemplateEdit,
};
use hb_table::{LoadOptions, TableCodec, WhitespaceTableCodec};

#[test]
fn parameters_and_templates_are_applied() {
    let ws = build_txtinout("apply", MODEL_SCRIPT);
    let set = ParameterSet::new()
        .with_parameter(
            ParameterEdit::indexed("hydrology.hyd", "name")
                .set_column("esco", "0.5")
                .set_cell("hyd002", "epco", "0.7"),
        )
        .with_template(TemplateEdit::new("soils.sol.tpl").with_token("awc", 0.25));

    SimulationRunner::new().apply_parameters(&ws, &set).unwrap();

    let table = WhitespaceTableCodec
        .load(&ws.file("hydrology.hyd"), &LoadOptions::indexed("name"))
        .unwrap();
    assert_eq!(table.column("esco").unwrap(), vec!["0.5", "0.5", "0.5"]);
    assert_eq!(table.get("hyd002", "epco").unwrap(), "0.7");
    assert_eq!(table.get("hyd001", "epco").unwrap(), "1.00000");
    assert_eq!(
        fs::read_to_string(ws.file("soils.sol")).unwrap(),
        "soils.sol\nname awc\nsoil01 0.25\n"
    );
}

#[test]
fn invalid_set_touches_nothing() {
    let ws = build_txtinout("invalid", MODEL_SCRIPT);
    let set = ParameterSet::new()
        .with_parameter(ParameterEdit::indexed("hydrology.hyd", "name").set_column("esco", "0.1"))
        .with_parameter(ParameterEdit::new("hydrology.hyd").set_cell("hyd001", "esco", "0.2"));

    let err = SimulationRunner::new().apply_parameters(&ws, &set).unwrap_err();
    assert!(matches!(err, RunError::InvalidEdit { .. }));
    assert_eq!(fs::read_to_string(ws.file("hydrology.hyd")).unwrap(), HYD);
}

#[test]
fn edit_failure_skips_the_executable() {
    let ws = build_txtinout("edit_failure", MODEL_SCRIPT);
    let set = ParameterSet::new()
        .with_parameter(ParameterEdit::new("hydrology.hyd").set_column("no_such_column", 1));

    let err = SimulationRunner::new()
        .run(&ws, &set, OutputMode::Quiet)
        .unwrap_err();
    assert!(matches!(err, RunError::Table(_)));
    assert!(!ws.file("model_echo.txt").exists());
}

#[test]
fn output_is_streamed_trimmed_and_latin1_decoded() {
    let ws = build_txtinout("stream", MODEL_SCRIPT);
    let mut lines = Vec::new();
    let mut sink = |line: &str| lines.push(line.to_string());

    let path = SimulationRunner::new()
        .invoke(&ws, OutputMode::Show(&mut sink))
        .unwrap();

    assert_eq!(path.as_path(), ws.root());
    assert_eq!(
        lines,
        ["SWAT+ test model", "ratio été", "Execution successfully completed"]
    );
    // Ran with the workspace as its working directory.
    assert_eq!(fs::read_to_string(ws.file("model_echo.txt")).unwrap(), HYD);
}

#[test]
fn utf8_decoding_skips_invalid_bytes() {
    let ws = build_txtinout("utf8", MODEL_SCRIPT);
    let mut lines = Vec::new();
    let mut sink = |line: &str| lines.push(line.to_string());

    SimulationRunner::new()
        .with_decoding(OutputDecoding::Utf8Skip)
        .invoke(&ws, OutputMode::Show(&mut sink))
        .unwrap();

    assert_eq!(lines[1], "ratio t");
}

#[test]
fn nonzero_exit_is_an_error_with_stderr_tail() {
    let ws = build_txtinout("failing", FAILING_SCRIPT);
    let err = SimulationRunner::new()
        .invoke(&ws, OutputMode::Quiet)
        .unwrap_err();
    match err {
        RunError::ExecutableFailed {
            code, stderr_tail, ..
        } => {
            assert_eq!(code, Some(2));
            assert_eq!(stderr_tail, vec!["ERROR: esco out of range".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn run_returns_the_workspace_path() {
    let ws = build_txtinout("run", MODEL_SCRIPT);
    let path = SimulationRunner::new()
        .run(&ws, &ParameterSet::new(), OutputMode::Log)
        .unwrap();
    assert_eq!(path.as_path(), ws.root());
}

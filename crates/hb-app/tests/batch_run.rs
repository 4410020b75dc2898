#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use hb_app::{
    AppError, BatchOptions, BatchProgressEvent, BatchRequest, BatchStage, SingleRunRequest,
    execute_batch, execute_batch_with_progress, get_batch_summary, list_batches,
    load_batch_manifest, run_single,
};
use hb_patch::{PrintFrequency, format_object_line, read_simulation_window};
use hb_results::RunStatus;
use hb_runner::{Backend, ParameterEdit, ParameterSet, ThreadExecutor};

const MODEL_SCRIPT: &str = "#!/bin/sh
echo 'SWAT+ test model'
test -f print.prt || exit 4
cp hydrology.hyd model_echo.txt
echo 'Execution successfully completed'
";

const PRINT_PRT: &str = "\
print.prt: written by SWAT+ editor v2.3.0
nyskip      day_start   yrc_start   day_end     yrc_end     interval
1           0           0           0           0           1
aa_int_cnt
0
csvout      dbout       cdfout
n           n           n
crop_yld    mgtout      hydcon      fdcout
b           n           n           n
objects                      daily         monthly       yearly        avann
basin_wb                     n             n             y             y
channel_sd                   n             n             y             y
";

const TIME_SIM: &str = "\
time.sim: written by SWAT+ editor v2.3.0
day_start  yrc_start   day_end   yrc_end      step
       0       1980          0      1985         0
";

const HYD: &str = "\
hydrology.hyd: written by editor
name      lat_ttime     esco     epco
hyd001      0.00000  0.95000  1.00000
hyd002      0.00000  0.90000  1.00000
";

const BATCH: &str = "\
version: 1
name: calibration
workspace: TxtInOut
target_dir: runs
workers: 2
setup:
  simulation: { start: 2010-01-01, end: 2012-12-31 }
  csv_output: true
  print_objects:
    - { name: channel_sd, daily: true, avann: true }
sets:
  - name: low
    parameters:
      - file: hydrology.hyd
        index: name
        edits:
          - { column: esco, value: 0.3 }
  - name: broken
    parameters:
      - file: hydrology.hyd
        edits:
          - { column: no_such_column, value: 1 }
  - name: high
    parameters:
      - file: hydrology.hyd
        index: name
        edits:
          - { row: hyd002, column: esco, value: 0.7 }
    templates:
      - { template: soils.sol.tpl, tokens: { awc: 0.25 } }
";

/// A project folder holding `TxtInOut/` and `batch.yaml`.
fn build_project(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "hb_app_{}_{}",
        label,
        uuid::Uuid::new_v4().simple()
    ));
    let txtinout = dir.join("TxtInOut");
    fs::create_dir_all(&txtinout).unwrap();

    let exe = txtinout.join("swat.exe");
    fs::write(&exe, MODEL_SCRIPT).unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    fs::write(txtinout.join("print.prt"), PRINT_PRT).unwrap();
    fs::write(txtinout.join("time.sim"), TIME_SIM).unwrap();
    fs::write(txtinout.join("hydrology.hyd"), HYD).unwrap();
    fs::write(txtinout.join("soils.sol.tpl"), "soils.sol\nsoil01 #awc#\n").unwrap();

    let batch_path = dir.join("batch.yaml");
    fs::write(&batch_path, BATCH).unwrap();
    batch_path
}

fn request(batch_path: &Path) -> BatchRequest<'_> {
    BatchRequest {
        batch_path,
        options: BatchOptions::default(),
        backend: Backend::Local,
    }
}

#[test]
fn batch_runs_records_and_reports() {
    let batch_path = build_project("full");
    let project_dir = batch_path.parent().unwrap().to_path_buf();

    let mut events: Vec<BatchProgressEvent> = Vec::new();
    let response =
        execute_batch_with_progress(&request(&batch_path), Some(&mut |e| events.push(e))).unwrap();

    let manifest = &response.manifest;
    let names: Vec<&str> = manifest.runs.iter().map(|r| r.set_name.as_str()).collect();
    assert_eq!(names, ["low", "broken", "high"]);
    let statuses: Vec<RunStatus> = manifest.runs.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [RunStatus::Succeeded, RunStatus::Failed, RunStatus::Succeeded]
    );
    assert!(manifest.runs[1].error.as_deref().unwrap().contains("no_such_column"));

    let low = manifest.runs[0].workspace.as_ref().unwrap();
    assert_eq!(low.parent(), Some(project_dir.join("runs").as_path()));
    let echoed = fs::read_to_string(low.join("model_echo.txt")).unwrap();
    assert!(echoed.contains("0.3") && !echoed.contains("0.95000"));
    let high = manifest.runs[2].workspace.as_ref().unwrap();
    assert_eq!(
        fs::read_to_string(high.join("soils.sol")).unwrap(),
        "soils.sol\nsoil01 0.25\n"
    );

    // Setup patched the source before cloning, so clones carry it too.
    let source = project_dir.join("TxtInOut");
    let window = read_simulation_window(&source.join("time.sim")).unwrap();
    assert_eq!((window.start.day, window.start.year), (1, 2010));
    assert_eq!((window.end.day, window.end.year), (366, 2012));
    let print_prt = fs::read_to_string(low.join("print.prt")).unwrap();
    assert!(print_prt.contains(&format_object_line(
        "channel_sd",
        PrintFrequency::new(true, false, false, true)
    )));
    assert!(print_prt.lines().nth(6).unwrap().starts_with('y'));

    let stages: Vec<BatchStage> = events.iter().map(|e| e.stage).collect();
    for stage in [
        BatchStage::LoadingBatch,
        BatchStage::ApplyingSetup,
        BatchStage::RunningSets,
        BatchStage::SavingManifest,
    ] {
        assert!(stages.contains(&stage), "missing {stage:?}");
    }
    assert_eq!(stages.last(), Some(&BatchStage::Completed));
    let mut completed: Vec<usize> = events
        .iter()
        .filter(|e| e.stage == BatchStage::RunningSets && e.completed > 0)
        .map(|e| e.completed)
        .collect();
    completed.sort();
    assert_eq!(completed, [1, 2, 3]);

    let manifest_path = response.manifest_path.as_ref().unwrap();
    assert!(manifest_path.starts_with(project_dir.join("runs").join(".hydrobatch")));
    let listed = list_batches(&batch_path).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].batch_id, response.batch_id);
    let loaded = load_batch_manifest(&batch_path, &response.batch_id).unwrap();
    let summary = get_batch_summary(&loaded);
    assert_eq!((summary.succeeded, summary.failed), (2, 1));
    assert!(summary.mean_run_s.is_some());
}

#[test]
fn options_override_the_batch_file() {
    let batch_path = build_project("options");
    let project_dir = batch_path.parent().unwrap().to_path_buf();
    let elsewhere = project_dir.join("elsewhere");

    let response = execute_batch(&BatchRequest {
        batch_path: &batch_path,
        options: BatchOptions {
            workers: Some(1),
            target_dir: Some(elsewhere.clone()),
            skip_setup: true,
            persist: false,
        },
        backend: Backend::Local,
    })
    .unwrap();

    assert_eq!(response.manifest.workers, 1);
    assert!(response.manifest_path.is_none());
    let low = response.manifest.runs[0].workspace.as_ref().unwrap();
    assert!(low.starts_with(&elsewhere));
    assert_eq!(
        fs::read_to_string(project_dir.join("TxtInOut").join("time.sim")).unwrap(),
        TIME_SIM
    );
}

#[test]
fn distributed_backend_keeps_set_order() {
    let batch_path = build_project("distributed");
    let executor = ThreadExecutor::new(3);
    let response = execute_batch(&BatchRequest {
        batch_path: &batch_path,
        options: BatchOptions::default(),
        backend: Backend::Distributed(&executor),
    })
    .unwrap();

    let statuses: Vec<RunStatus> = response.manifest.runs.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [RunStatus::Succeeded, RunStatus::Failed, RunStatus::Succeeded]
    );
    assert!(response.manifest.runs.iter().all(|r| r.duration_s.is_none()));
}

#[test]
fn invalid_batches_are_reported() {
    let batch_path = build_project("invalid");
    fs::write(&batch_path, BATCH.replace("workers: 2", "workers: 0")).unwrap();
    assert!(matches!(
        execute_batch(&request(&batch_path)),
        Err(AppError::Validation(_))
    ));

    let missing = batch_path.with_file_name("missing.yaml");
    assert!(matches!(
        execute_batch(&request(&missing)),
        Err(AppError::BatchFileRead { .. })
    ));
}

#[test]
fn single_run_in_place_and_in_a_clone() {
    let batch_path = build_project("single");
    let project_dir = batch_path.parent().unwrap().to_path_buf();
    let source = project_dir.join("TxtInOut");
    let target = project_dir.join("single");

    let set = ParameterSet::new()
        .with_parameter(ParameterEdit::indexed("hydrology.hyd", "name").set_column("esco", 0.5));
    let mut lines = Vec::new();
    let mut sink = |line: &str| lines.push(line.to_string());
    let ran_in = run_single(
        &SingleRunRequest {
            workspace: &source,
            executable_suffix: None,
            target: Some(target.as_path()),
            overwrite: true,
            set: set.clone(),
        },
        Some(&mut sink),
    )
    .unwrap();

    assert_eq!(ran_in, target);
    assert_eq!(lines, ["SWAT+ test model", "Execution successfully completed"]);
    assert!(target.join("model_echo.txt").exists());
    assert_eq!(fs::read_to_string(source.join("hydrology.hyd")).unwrap(), HYD);

    let ran_in = run_single(
        &SingleRunRequest {
            workspace: &source,
            executable_suffix: Some(".exe"),
            target: None,
            overwrite: false,
            set,
        },
        None,
    )
    .unwrap();
    assert_eq!(ran_in, source);
    assert!(source.join("model_echo.txt").exists());
}

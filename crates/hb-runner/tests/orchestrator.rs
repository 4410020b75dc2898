#![cfg(unix)]

mod common;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use common::{MODEL_SCRIPT, build_txtinout, scratch_dir, slow_model_script};
use hb_runner::{
    Backend, DistributedExecutor, Orchestrator, OutputMode, ParameterEdit, ParameterSet,
    PendingRun, RunError, RunTask, TaskFn, TaskProgress, ThreadExecutor, clamp_workers,
};
use hb_table::{LoadOptions, TableCodec, WhitespaceTableCodec};

fn esco_sets(n: usize) -> Vec<ParameterSet> {
    (0..n)
        .map(|i| {
            ParameterSet::new().with_parameter(
                ParameterEdit::indexed("hydrology.hyd", "name")
                    .set_column("esco", format!("0.{}", i + 1)),
            )
        })
        .collect()
}

fn esco_of(workspace: &Path) -> Vec<String> {
    WhitespaceTableCodec
        .load(&workspace.join("hydrology.hyd"), &LoadOptions::indexed("name"))
        .unwrap()
        .column("esco")
        .unwrap()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn assert_in_order(outcomes: &[Result<PathBuf, RunError>]) {
    let mut seen = HashSet::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        let path = outcome.as_ref().unwrap();
        assert!(seen.insert(path.clone()), "workspace reused: {}", path.display());
        let expected = format!("0.{}", i + 1);
        assert!(esco_of(path).iter().all(|v| *v == expected));
        assert!(path.join("model_echo.txt").exists());
    }
}

/// Runs everything in reverse and reports it that way too.
struct ReversingExecutor;

impl DistributedExecutor for ReversingExecutor {
    fn map(&self, job: TaskFn, tasks: Vec<RunTask>) -> Vec<PendingRun> {
        tasks
            .into_iter()
            .rev()
            .map(|task| {
                let (sender, pending) = PendingRun::channel(task.index);
                sender.send(job(task)).unwrap();
                pending
            })
            .collect()
    }
}

/// Accepts tasks and never runs them.
struct BlackHoleExecutor;

impl DistributedExecutor for BlackHoleExecutor {
    fn map(&self, _job: TaskFn, tasks: Vec<RunTask>) -> Vec<PendingRun> {
        tasks
            .iter()
            .map(|task| PendingRun::channel(task.index).1)
            .collect()
    }
}

#[test]
fn local_pool_returns_results_in_input_order() {
    let ws = build_txtinout("local", MODEL_SCRIPT);
    let target = scratch_dir("local_target");
    let orchestrator = Orchestrator::new(ws.clone());

    let outcomes = orchestrator
        .run_many(&esco_sets(5), 3, Some(target.as_path()), Backend::Local, None)
        .unwrap();

    assert_eq!(outcomes.len(), 5);
    assert_in_order(&outcomes);
    for outcome in &outcomes {
        assert_eq!(outcome.as_ref().unwrap().parent(), Some(target.as_path()));
    }
    // The source itself is never edited.
    assert_eq!(esco_of(ws.root()), ["0.95000", "0.90000", "0.85000"]);
}

#[test]
fn local_order_holds_when_later_sets_finish_first() {
    let log = scratch_dir("finish_log").join("finished.txt");
    let ws = build_txtinout("reverse_finish", &slow_model_script(&log));

    let outcomes = Orchestrator::new(ws)
        .run_many(&esco_sets(5), 5, None, Backend::Local, None)
        .unwrap();

    assert_in_order(&outcomes);
    let finished: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(|l| l.trim().to_string())
        .collect();
    assert_eq!(finished.len(), 5);
    if clamp_workers(5) > 1 {
        // Set 0 sleeps longest, so with any concurrency it cannot finish first.
        assert_ne!(finished[0], "0.1");
    }
}

#[test]
fn failing_set_only_fails_its_slot() {
    let ws = build_txtinout("isolation", MODEL_SCRIPT);
    let mut sets = esco_sets(4);
    sets[2] = ParameterSet::new()
        .with_parameter(ParameterEdit::new("missing.hyd").set_column("esco", 0.1));

    let outcomes = Orchestrator::new(ws)
        .run_many(&sets, 2, None, Backend::Local, None)
        .unwrap();

    assert!(matches!(outcomes[2], Err(RunError::Table(_))));
    for i in [0, 1, 3] {
        let path = outcomes[i].as_ref().unwrap();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(esco_of(path)[0], format!("0.{}", i + 1));
    }
}

#[test]
fn progress_is_reported_once_per_task() {
    let ws = build_txtinout("progress", MODEL_SCRIPT);
    let events: Mutex<Vec<TaskProgress>> = Mutex::new(Vec::new());
    let report = |event: &TaskProgress| events.lock().unwrap().push(event.clone());

    Orchestrator::new(ws)
        .run_many(&esco_sets(4), 2, None, Backend::Local, Some(&report))
        .unwrap();

    let events = events.into_inner().unwrap();
    let mut completed: Vec<usize> = events.iter().map(|e| e.completed).collect();
    completed.sort();
    assert_eq!(completed, [1, 2, 3, 4]);
    let mut indices: Vec<usize> = events.iter().map(|e| e.index).collect();
    indices.sort();
    assert_eq!(indices, [0, 1, 2, 3]);
    assert!(events.iter().all(|e| e.total == 4 && e.error.is_none()));
}

#[test]
fn distributed_results_are_reordered() {
    let ws = build_txtinout("reverse", MODEL_SCRIPT);
    let outcomes = Orchestrator::new(ws)
        .run_many(&esco_sets(4), 2, None, Backend::Distributed(&ReversingExecutor), None)
        .unwrap();
    assert_in_order(&outcomes);
}

#[test]
fn thread_executor_runs_every_task() {
    let ws = build_txtinout("threads", MODEL_SCRIPT);
    let executor = ThreadExecutor::new(2);
    let outcomes = Orchestrator::new(ws)
        .run_many(&esco_sets(5), 2, None, Backend::Distributed(&executor), None)
        .unwrap();
    assert_eq!(outcomes.len(), 5);
    assert_in_order(&outcomes);
}

#[test]
fn unanswered_tasks_are_reported_lost() {
    let ws = build_txtinout("lost", MODEL_SCRIPT);
    let outcomes = Orchestrator::new(ws)
        .run_many(&esco_sets(3), 2, None, Backend::Distributed(&BlackHoleExecutor), None)
        .unwrap();
    for (i, outcome) in outcomes.iter().enumerate() {
        assert!(matches!(outcome, Err(RunError::TaskLost { index }) if *index == i));
    }
}

#[test]
fn empty_batch_runs_nothing() {
    let ws = build_txtinout("empty", MODEL_SCRIPT);
    let outcomes = Orchestrator::new(ws)
        .run_many(&[], 4, None, Backend::Local, None)
        .unwrap();
    assert!(outcomes.is_empty());
}

#[test]
fn run_one_with_overwrite_reuses_the_target() {
    let ws = build_txtinout("single", MODEL_SCRIPT);
    let target = scratch_dir("single_target");
    let orchestrator = Orchestrator::new(ws);

    let first = orchestrator
        .run_one(Some(target.as_path()), true, &esco_sets(1)[0], OutputMode::Quiet)
        .unwrap();
    let second = orchestrator
        .run_one(Some(target.as_path()), true, &esco_sets(2)[1], OutputMode::Quiet)
        .unwrap();

    assert_eq!(first, target);
    assert_eq!(second, target);
    assert_eq!(esco_of(&target)[0], "0.2");
}

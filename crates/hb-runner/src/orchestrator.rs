//! Batches of independent runs against one source workspace.
//!
//! Every task clones the source into its own directory before editing, so
//! workers never share files. Results always come back in input order, one
//! per parameter set, whichever backend executed them and whatever order they
//! finished in.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use hb_workspace::Workspace;
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::edits::ParameterSet;
use crate::error::{RunError, RunResult};
use crate::executor::{DistributedExecutor, TaskFn};
use crate::runner::{OutputMode, SimulationRunner};

/// Path of the run's workspace, or why the run failed.
pub type TaskOutcome = RunResult<PathBuf>;

/// Self-contained description of one run, as handed to a backend.
#[derive(Debug, Clone)]
pub struct RunTask {
    pub index: usize,
    pub target_dir: Option<PathBuf>,
    pub overwrite: bool,
    pub set: ParameterSet,
    pub show_output: bool,
}

/// Reported once per finished task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub index: usize,
    pub completed: usize,
    pub total: usize,
    pub workspace: Option<PathBuf>,
    pub error: Option<String>,
    /// Wall time of the task, when the backend measured it.
    pub duration_s: Option<f64>,
}

impl TaskProgress {
    fn new(
        index: usize,
        completed: usize,
        total: usize,
        outcome: &TaskOutcome,
        duration_s: Option<f64>,
    ) -> Self {
        let (workspace, error) = match outcome {
            Ok(path) => (Some(path.clone()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            index,
            completed,
            total,
            workspace,
            error,
            duration_s,
        }
    }
}

#[derive(Clone, Copy, Default)]
pub enum Backend<'a> {
    /// Rayon pool in this process.
    #[default]
    Local,
    Distributed(&'a dyn DistributedExecutor),
}

/// Requested worker count, bounded to `[1, available CPUs]`.
pub fn clamp_workers(requested: usize) -> usize {
    let available = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    requested.clamp(1, available)
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    source: Workspace,
    runner: SimulationRunner,
}

impl Orchestrator {
    pub fn new(source: Workspace) -> Self {
        Self::with_runner(source, SimulationRunner::default())
    }

    pub fn with_runner(source: Workspace, runner: SimulationRunner) -> Self {
        Self { source, runner }
    }

    pub fn source(&self) -> &Workspace {
        &self.source
    }

    pub fn runner(&self) -> &SimulationRunner {
        &self.runner
    }

    /// Clone the source, apply `set` to the clone and run it.
    pub fn run_one(
        &self,
        target: Option<&Path>,
        overwrite: bool,
        set: &ParameterSet,
        output: OutputMode<'_>,
    ) -> TaskOutcome {
        let workspace = self.source.clone_workspace(target, overwrite)?;
        self.runner.run(&workspace, set, output)
    }

    pub fn run_task(&self, task: RunTask) -> TaskOutcome {
        let span = info_span!("run", index = task.index);
        let _guard = span.enter();

        let output = if task.show_output {
            OutputMode::Log
        } else {
            OutputMode::Quiet
        };
        let outcome = self.run_one(task.target_dir.as_deref(), task.overwrite, &task.set, output);
        match &outcome {
            Ok(path) => info!(workspace = %path.display(), "run finished"),
            Err(err) => warn!(error = %err, "run failed"),
        }
        outcome
    }

    /// Run every set in its own fresh clone under `target` (or the system
    /// temp dir). A failing set only fails its own slot.
    ///
    /// Errors only when the batch itself cannot start.
    pub fn run_many(
        &self,
        sets: &[ParameterSet],
        workers: usize,
        target: Option<&Path>,
        backend: Backend<'_>,
        progress: Option<&(dyn Fn(&TaskProgress) + Sync)>,
    ) -> RunResult<Vec<TaskOutcome>> {
        if sets.is_empty() {
            return Ok(Vec::new());
        }
        let workers = clamp_workers(workers);
        let tasks: Vec<RunTask> = sets
            .iter()
            .enumerate()
            .map(|(index, set)| RunTask {
                index,
                target_dir: target.map(Path::to_path_buf),
                overwrite: false,
                set: set.clone(),
                show_output: false,
            })
            .collect();

        info!(
            runs = tasks.len(),
            workers,
            source = %self.source.root().display(),
            "starting batch"
        );
        match backend {
            Backend::Local => self.run_local(tasks, workers, progress),
            Backend::Distributed(executor) => Ok(self.run_distributed(tasks, executor, progress)),
        }
    }

    fn run_local(
        &self,
        tasks: Vec<RunTask>,
        workers: usize,
        progress: Option<&(dyn Fn(&TaskProgress) + Sync)>,
    ) -> RunResult<Vec<TaskOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("hb-worker-{i}"))
            .build()
            .map_err(|err| RunError::ThreadPool(err.to_string()))?;

        let total = tasks.len();
        let completed = AtomicUsize::new(0);
        let outcomes = pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| {
                    let index = task.index;
                    let started = Instant::now();
                    let outcome = self.run_task(task);
                    let duration_s = started.elapsed().as_secs_f64();
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(report) = progress {
                        report(&TaskProgress::new(
                            index,
                            done,
                            total,
                            &outcome,
                            Some(duration_s),
                        ));
                    }
                    outcome
                })
                .collect::<Vec<_>>()
        });
        Ok(outcomes)
    }

    fn run_distributed(
        &self,
        tasks: Vec<RunTask>,
        executor: &dyn DistributedExecutor,
        progress: Option<&(dyn Fn(&TaskProgress) + Sync)>,
    ) -> Vec<TaskOutcome> {
        let total = tasks.len();
        let this = self.clone();
        let job: TaskFn = Arc::new(move |task: RunTask| this.run_task(task));
        let pending = executor.map(job, tasks);

        let mut slots: Vec<Option<TaskOutcome>> = (0..total).map(|_| None).collect();
        for (done, (index, outcome)) in executor.gather(pending).into_iter().enumerate() {
            if let Some(report) = progress {
                report(&TaskProgress::new(index, done + 1, total, &outcome, None));
            }
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(outcome),
                _ => warn!(index, "executor returned an unknown or duplicate task; ignored"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| Err(RunError::TaskLost { index })))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_are_clamped() {
        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        assert_eq!(clamp_workers(0), 1);
        assert_eq!(clamp_workers(1), 1);
        assert_eq!(clamp_workers(usize::MAX), available);
    }

    #[test]
    fn progress_carries_error_text() {
        let outcome: TaskOutcome = Err(RunError::TaskLost { index: 3 });
        let progress = TaskProgress::new(3, 1, 4, &outcome, None);
        assert_eq!(progress.workspace, None);
        assert_eq!(progress.error.as_deref(), Some("Task 3 produced no result"));
    }
}

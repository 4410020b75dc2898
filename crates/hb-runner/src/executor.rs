//! Pluggable backends for running a batch somewhere other than the local
//! rayon pool.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::warn;

use crate::error::RunError;
use crate::orchestrator::{RunTask, TaskOutcome};

/// The work a backend executes for each task.
pub type TaskFn = Arc<dyn Fn(RunTask) -> TaskOutcome + Send + Sync>;

/// Handle to a submitted task. Dropping the sending side without a result
/// turns into [`RunError::TaskLost`].
#[derive(Debug)]
pub struct PendingRun {
    index: usize,
    receiver: Receiver<TaskOutcome>,
}

impl PendingRun {
    pub fn channel(index: usize) -> (Sender<TaskOutcome>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { index, receiver })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn wait(self) -> (usize, TaskOutcome) {
        let index = self.index;
        let outcome = self
            .receiver
            .recv()
            .unwrap_or_else(|_| Err(RunError::TaskLost { index }));
        (index, outcome)
    }
}

/// Map/gather contract for external executors.
///
/// `gather` may return results in any order; they are put back in task order
/// by the orchestrator.
pub trait DistributedExecutor: Sync {
    /// Submit every task without waiting for completion.
    fn map(&self, job: TaskFn, tasks: Vec<RunTask>) -> Vec<PendingRun>;

    fn gather(&self, pending: Vec<PendingRun>) -> Vec<(usize, TaskOutcome)> {
        pending.into_iter().map(PendingRun::wait).collect()
    }
}

/// Plain OS threads pulling from a shared queue.
#[derive(Debug, Clone, Copy)]
pub struct ThreadExecutor {
    workers: usize,
}

impl ThreadExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl DistributedExecutor for ThreadExecutor {
    fn map(&self, job: TaskFn, tasks: Vec<RunTask>) -> Vec<PendingRun> {
        let mut pending = Vec::with_capacity(tasks.len());
        let mut queue = VecDeque::with_capacity(tasks.len());
        for task in tasks {
            let (sender, run) = PendingRun::channel(task.index);
            pending.push(run);
            queue.push_back((task, sender));
        }

        let queue = Arc::new(Mutex::new(queue));
        for worker in 0..self.workers.min(pending.len()) {
            let queue = Arc::clone(&queue);
            let job = Arc::clone(&job);
            let spawned = thread::Builder::new()
                .name(format!("hb-exec-{worker}"))
                .spawn(move || {
                    loop {
                        let next = match queue.lock() {
                            Ok(mut queue) => queue.pop_front(),
                            Err(poisoned) => poisoned.into_inner().pop_front(),
                        };
                        let Some((task, sender)) = next else { break };
                        // The caller may have stopped waiting.
                        let _ = sender.send(job(task));
                    }
                });
            if let Err(err) = spawned {
                warn!(worker, error = %err, "failed to start executor thread");
            }
        }
        pending
    }
}

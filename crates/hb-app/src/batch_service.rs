//! Batch execution and manifest persistence.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use hb_results::{BatchManifest, BatchStore, RunRecord, RunStatus};
use hb_runner::{Backend, Orchestrator, TaskProgress};
use tracing::{info, warn};

use crate::batch_compile::{apply_setup, compile_sets};
use crate::error::{AppError, AppResult};
use crate::progress::{BatchProgressEvent, BatchStage};
use crate::project_service::{self, base_dir, resolve_target_dir, resolve_workspace};
use crate::workspace_service::open_workspace;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Overrides the batch file's worker count.
    pub workers: Option<usize>,
    /// Overrides the batch file's target directory.
    pub target_dir: Option<PathBuf>,
    pub skip_setup: bool,
    /// Write the manifest to the batch store.
    pub persist: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: None,
            target_dir: None,
            skip_setup: false,
            persist: true,
        }
    }
}

pub struct BatchRequest<'a> {
    pub batch_path: &'a Path,
    pub options: BatchOptions,
    pub backend: Backend<'a>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchTimingSummary {
    pub setup_time_s: f64,
    pub run_time_s: f64,
    pub save_time_s: f64,
    pub total_time_s: f64,
}

#[derive(Debug, Clone)]
pub struct BatchResponse {
    pub batch_id: String,
    pub manifest: BatchManifest,
    pub manifest_path: Option<PathBuf>,
    pub timing: BatchTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(BatchProgressEvent)>,
    stage: BatchStage,
    completed: usize,
    total: usize,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(BatchProgressEvent {
            stage,
            completed,
            total,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
        });
    }
}

pub fn execute_batch(request: &BatchRequest) -> AppResult<BatchResponse> {
    execute_batch_with_progress(request, None)
}

/// Load, set up, run and record a batch, streaming progress events.
///
/// Individual run failures end up in the manifest; only problems that stop
/// the whole batch are returned as errors.
pub fn execute_batch_with_progress(
    request: &BatchRequest,
    mut progress_cb: Option<&mut dyn FnMut(BatchProgressEvent)>,
) -> AppResult<BatchResponse> {
    let started = Instant::now();
    let mut timing = BatchTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        BatchStage::LoadingBatch,
        0,
        0,
        started,
        Some("Loading batch".to_string()),
    );
    let batch = project_service::load_batch(request.batch_path)?;
    let total = batch.sets.len();

    let workspace_dir = resolve_workspace(request.batch_path, &batch);
    emit_progress(
        &mut progress_cb,
        BatchStage::OpeningWorkspace,
        0,
        total,
        started,
        Some(format!("Opening {}", workspace_dir.display())),
    );
    let source = open_workspace(&workspace_dir, batch.executable_suffix.as_deref())?;

    if let Some(setup) = batch.setup.as_ref().filter(|_| !request.options.skip_setup) {
        emit_progress(
            &mut progress_cb,
            BatchStage::ApplyingSetup,
            0,
            total,
            started,
            Some("Applying setup to source workspace".to_string()),
        );
        let setup_started = Instant::now();
        apply_setup(&source, setup)?;
        timing.setup_time_s = setup_started.elapsed().as_secs_f64();
    }

    let sets = compile_sets(&batch);
    let workers = request.options.workers.unwrap_or(batch.workers);
    if workers == 0 {
        return Err(AppError::InvalidInput(
            "at least one worker is required".to_string(),
        ));
    }
    let target = request
        .options
        .target_dir
        .clone()
        .or_else(|| resolve_target_dir(request.batch_path, &batch));

    emit_progress(
        &mut progress_cb,
        BatchStage::RunningSets,
        0,
        total,
        started,
        Some(format!("Running {} sets on up to {} workers", total, workers)),
    );
    let run_started = Instant::now();
    let orchestrator = Orchestrator::new(source);
    let mut durations: Vec<Option<f64>> = vec![None; total];

    // Workers report from pool threads; the caller's callback stays on this one.
    let (sender, receiver) = mpsc::channel::<TaskProgress>();
    let joined = thread::scope(|scope| {
        let backend = request.backend;
        let orchestrator = &orchestrator;
        let sets = &sets;
        let target = target.as_deref();
        let worker = scope.spawn(move || {
            let report = move |event: &TaskProgress| {
                let _ = sender.send(event.clone());
            };
            orchestrator.run_many(sets, workers, target, backend, Some(&report))
        });

        for event in receiver {
            if let Some(slot) = durations.get_mut(event.index) {
                *slot = event.duration_s;
            }
            let set_name = batch
                .sets
                .get(event.index)
                .map_or("?", |set| set.name.as_str());
            let message = match &event.error {
                Some(err) => format!("Set '{}' failed: {}", set_name, err),
                None => format!("Set '{}' finished", set_name),
            };
            emit_progress(
                &mut progress_cb,
                BatchStage::RunningSets,
                event.completed,
                total,
                started,
                Some(message),
            );
        }
        worker.join()
    });
    let outcomes = match joined {
        Ok(result) => result?,
        Err(_) => return Err(AppError::Run("batch worker panicked".to_string())),
    };
    timing.run_time_s = run_started.elapsed().as_secs_f64();

    let runs: Vec<RunRecord> = batch
        .sets
        .iter()
        .zip(outcomes)
        .zip(durations)
        .enumerate()
        .map(|(index, ((def, outcome), duration_s))| {
            let set_hash = hb_results::compute_set_hash(def);
            match outcome {
                Ok(workspace) => RunRecord {
                    index,
                    set_name: def.name.clone(),
                    set_hash,
                    status: RunStatus::Succeeded,
                    workspace: Some(workspace),
                    error: None,
                    duration_s,
                },
                Err(err) => {
                    warn!(set = %def.name, error = %err, "run failed");
                    RunRecord {
                        index,
                        set_name: def.name.clone(),
                        set_hash,
                        status: RunStatus::Failed,
                        workspace: None,
                        error: Some(err.to_string()),
                        duration_s,
                    }
                }
            }
        })
        .collect();

    let timestamp = hb_results::timestamp_now();
    let batch_id = hb_results::compute_batch_id(&batch, &timestamp);
    let manifest = BatchManifest {
        batch_id: batch_id.clone(),
        name: batch.name.clone(),
        timestamp,
        workspace: workspace_dir,
        workers,
        elapsed_s: timing.run_time_s,
        runs,
    };

    let manifest_path = if request.options.persist {
        emit_progress(
            &mut progress_cb,
            BatchStage::SavingManifest,
            total,
            total,
            started,
            Some("Saving manifest".to_string()),
        );
        let save_started = Instant::now();
        let store_dir = target.unwrap_or_else(|| base_dir(request.batch_path));
        let path = BatchStore::for_dir(&store_dir)?.save_batch(&manifest)?;
        timing.save_time_s = save_started.elapsed().as_secs_f64();
        Some(path)
    } else {
        None
    };

    let succeeded = manifest.succeeded().count();
    timing.total_time_s = started.elapsed().as_secs_f64();
    info!(
        batch = %manifest.name,
        batch_id = %batch_id,
        succeeded,
        failed = total - succeeded,
        elapsed_s = timing.total_time_s,
        "batch finished"
    );
    emit_progress(
        &mut progress_cb,
        BatchStage::Completed,
        total,
        total,
        started,
        Some(format!("{}/{} runs succeeded", succeeded, total)),
    );

    Ok(BatchResponse {
        batch_id,
        manifest,
        manifest_path,
        timing,
    })
}

fn store_for(batch_path: &Path) -> AppResult<BatchStore> {
    let batch = project_service::load_batch(batch_path)?;
    Ok(BatchStore::for_dir(&project_service::store_dir(batch_path, &batch))?)
}

/// Manifests recorded for a batch file, oldest first.
pub fn list_batches(batch_path: &Path) -> AppResult<Vec<BatchManifest>> {
    Ok(store_for(batch_path)?.list_batches()?)
}

pub fn load_batch_manifest(batch_path: &Path, batch_id: &str) -> AppResult<BatchManifest> {
    Ok(store_for(batch_path)?.load_batch(batch_id)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    LoadingBatch,
    OpeningWorkspace,
    ApplyingSetup,
    RunningSets,
    SavingManifest,
    Completed,
}

#[derive(Debug, Clone)]
pub struct BatchProgressEvent {
    pub stage: BatchStage,
    /// Runs finished so far; only advances during [`BatchStage::RunningSets`].
    pub completed: usize,
    pub total: usize,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

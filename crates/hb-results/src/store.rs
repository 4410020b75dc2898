//! Batch manifest storage API.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::BatchManifest;
use crate::{ResultsError, ResultsResult};

const STORE_DIR: &str = ".hydrobatch";
const MANIFEST: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct BatchStore {
    root_dir: PathBuf,
}

impl BatchStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store kept under `dir/.hydrobatch/batches`.
    pub fn for_dir(dir: &Path) -> ResultsResult<Self> {
        Self::new(dir.join(STORE_DIR).join("batches"))
    }

    /// Store next to a batch file.
    pub fn for_batch_file(batch_path: &Path) -> ResultsResult<Self> {
        let batch_dir = batch_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: format!("{} has no parent directory", batch_path.display()),
            })?;
        Self::for_dir(batch_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn batch_dir(&self, batch_id: &str) -> PathBuf {
        self.root_dir.join(batch_id)
    }

    pub fn has_batch(&self, batch_id: &str) -> bool {
        self.batch_dir(batch_id).join(MANIFEST).exists()
    }

    pub fn save_batch(&self, manifest: &BatchManifest) -> ResultsResult<PathBuf> {
        let batch_dir = self.batch_dir(&manifest.batch_id);
        fs::create_dir_all(&batch_dir)?;
        let path = batch_dir.join(MANIFEST);
        fs::write(&path, serde_json::to_string_pretty(manifest)?)?;
        Ok(path)
    }

    pub fn load_batch(&self, batch_id: &str) -> ResultsResult<BatchManifest> {
        let path = self.batch_dir(batch_id).join(MANIFEST);
        if !path.exists() {
            return Err(ResultsError::BatchNotFound {
                batch_id: batch_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every readable manifest, oldest first. Unreadable entries are skipped.
    pub fn list_batches(&self) -> ResultsResult<Vec<BatchManifest>> {
        let mut batches = Vec::new();
        if !self.root_dir.exists() {
            return Ok(batches);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let batch_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_batch(&batch_id) {
                    batches.push(manifest);
                }
            }
        }
        batches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(batches)
    }

    pub fn delete_batch(&self, batch_id: &str) -> ResultsResult<()> {
        let batch_dir = self.batch_dir(batch_id);
        if batch_dir.exists() {
            fs::remove_dir_all(batch_dir)?;
        }
        Ok(())
    }
}

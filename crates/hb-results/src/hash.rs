//! Content hashes for batch ids and parameter sets.

use hb_project::{BatchDef, ParameterSetDef};
use sha2::{Digest, Sha256};

/// Stable across runs: identical edits hash identically regardless of the set's name.
pub fn compute_set_hash(set: &ParameterSetDef) -> String {
    let mut hasher = Sha256::new();
    let parameters_json = serde_json::to_string(&set.parameters).unwrap_or_default();
    hasher.update(parameters_json.as_bytes());
    let templates_json = serde_json::to_string(&set.templates).unwrap_or_default();
    hasher.update(templates_json.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn compute_batch_id(batch: &BatchDef, timestamp: &str) -> String {
    let mut hasher = Sha256::new();
    let batch_json = serde_json::to_string(batch).unwrap_or_default();
    hasher.update(batch_json.as_bytes());
    hasher.update(timestamp.as_bytes());
    format!("{:x}", hasher.finalize())
}

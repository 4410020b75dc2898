use std::path::PathBuf;

use hb_results::*;

fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "hb_results_{}_{}",
        label,
        uuid::Uuid::new_v4().simple()
    ))
}

fn manifest(batch_id: &str, timestamp: &str) -> BatchManifest {
    BatchManifest {
        batch_id: batch_id.to_string(),
        name: "calibration".to_string(),
        timestamp: timestamp.to_string(),
        workspace: PathBuf::from("/data/TxtInOut"),
        workers: 2,
        elapsed_s: 12.5,
        runs: vec![
            RunRecord {
                index: 0,
                set_name: "baseline".to_string(),
                set_hash: "aa".to_string(),
                status: RunStatus::Succeeded,
                workspace: Some(PathBuf::from("/tmp/run-1")),
                error: None,
                duration_s: Some(6.0),
            },
            RunRecord {
                index: 1,
                set_name: "dry".to_string(),
                set_hash: "bb".to_string(),
                status: RunStatus::Failed,
                workspace: None,
                error: Some("swat.exe exited with exit status: 2".to_string()),
                duration_s: None,
            },
        ],
    }
}

#[test]
fn save_and_load_batch() {
    let store = BatchStore::for_dir(&scratch_dir("save")).unwrap();
    let original = manifest("batch_1", "2026-02-25T12:00:00+00:00");

    let path = store.save_batch(&original).unwrap();
    assert!(path.ends_with(".hydrobatch/batches/batch_1/manifest.json"));
    assert!(store.has_batch("batch_1"));

    let loaded = store.load_batch("batch_1").unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.succeeded().count(), 1);
    assert_eq!(loaded.failed().map(|r| r.index).collect::<Vec<_>>(), [1]);
}

#[test]
fn list_is_sorted_by_timestamp() {
    let store = BatchStore::new(scratch_dir("list")).unwrap();
    store
        .save_batch(&manifest("later", "2026-03-01T00:00:00+00:00"))
        .unwrap();
    store
        .save_batch(&manifest("earlier", "2026-01-01T00:00:00+00:00"))
        .unwrap();
    std::fs::create_dir_all(store.root_dir().join("junk")).unwrap();

    let ids: Vec<String> = store
        .list_batches()
        .unwrap()
        .into_iter()
        .map(|m| m.batch_id)
        .collect();
    assert_eq!(ids, ["earlier", "later"]);
}

#[test]
fn delete_and_missing_batches() {
    let store = BatchStore::new(scratch_dir("delete")).unwrap();
    store
        .save_batch(&manifest("gone", "2026-01-01T00:00:00+00:00"))
        .unwrap();
    store.delete_batch("gone").unwrap();
    store.delete_batch("never_existed").unwrap();

    assert!(matches!(
        store.load_batch("gone"),
        Err(ResultsError::BatchNotFound { .. })
    ));
}

#[test]
fn store_next_to_batch_file() {
    let dir = scratch_dir("batch_file");
    let store = BatchStore::for_batch_file(&dir.join("calibration.yaml")).unwrap();
    assert_eq!(store.root_dir(), dir.join(".hydrobatch").join("batches"));
    assert!(store.root_dir().is_dir());
}

/*!
 * Tests for the incremental store and the persistent result store
 */

use feedtrans::storage::{CompletedJob, IncrementalStore, ResultStore, TranslationRecord};
use feedtrans::translation::usage::UsageSnapshot;

fn record(text: &str, translation: &str, indices: &[usize]) -> TranslationRecord {
    TranslationRecord {
        text: text.to_string(),
        translation: translation.to_string(),
        indices: indices.to_vec(),
    }
}

#[test]
fn test_incremental_store_should_round_trip_row_map() {
    let temp = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(temp.path()).unwrap();

    store.append("s1", 0, &record("red", "rouge", &[1, 4])).unwrap();
    store.append("s1", 0, &record("blue", "bleu", &[2])).unwrap();

    let map = store.load("s1", 0).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map[&1], "rouge");
    assert_eq!(map[&4], "rouge");
    assert_eq!(map[&2], "bleu");
}

#[test]
fn test_incremental_store_load_missing_file_should_return_empty_map() {
    let temp = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(temp.path()).unwrap();
    assert!(store.load("nope", 0).unwrap().is_empty());
}

#[test]
fn test_incremental_store_should_skip_malformed_lines() {
    let temp = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(temp.path()).unwrap();

    std::fs::write(
        temp.path().join("s1_0.jsonl"),
        format!(
            "{}\n{{truncated garbage\n",
            serde_json::to_string(&record("red", "rouge", &[1])).unwrap()
        ),
    )
    .unwrap();

    let map = store.load("s1", 0).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[&1], "rouge");
}

#[test]
fn test_incremental_store_cleanup_should_remove_session_files_only() {
    let temp = tempfile::tempdir().unwrap();
    let store = IncrementalStore::new(temp.path()).unwrap();

    store.append("s1", 0, &record("a", "a", &[1])).unwrap();
    store.append("s1", 1, &record("b", "b", &[1])).unwrap();
    store.append("s2", 0, &record("c", "c", &[1])).unwrap();

    store.cleanup("s1").unwrap();
    assert!(store.load("s1", 0).unwrap().is_empty());
    assert!(store.load("s1", 1).unwrap().is_empty());
    assert_eq!(store.load("s2", 0).unwrap().len(), 1);
}

fn completed_job(language: &str) -> CompletedJob {
    CompletedJob {
        target_language: language.to_string(),
        duration_secs: 1.5,
        usage: UsageSnapshot::default(),
        files: vec![("out_fr.csv".to_string(), "\"a\"\n".to_string(), 10, false)],
    }
}

#[test]
fn test_result_store_save_should_persist_files_and_metadata() {
    let temp = tempfile::tempdir().unwrap();
    let store = ResultStore::new(temp.path()).unwrap();

    let metadata = store.save("s1", &completed_job("fr")).unwrap();
    assert_eq!(metadata.files.len(), 1);
    assert_eq!(metadata.files[0].lines_translated, 10);

    let loaded = store.session("s1").unwrap();
    assert_eq!(loaded.target_language, "fr");
    assert_eq!(store.file_content("s1", "out_fr.csv").unwrap(), "\"a\"\n");
}

#[test]
fn test_result_store_history_should_be_most_recent_first() {
    let temp = tempfile::tempdir().unwrap();
    let store = ResultStore::new(temp.path()).unwrap();

    store.save("s1", &completed_job("fr")).unwrap();
    store.save("s2", &completed_job("de")).unwrap();

    let history = store.history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].session_id, "s2");
    assert_eq!(history[1].session_id, "s1");
}

#[test]
fn test_result_store_should_evict_oldest_past_history_cap() {
    let temp = tempfile::tempdir().unwrap();
    let store = ResultStore::new(temp.path()).unwrap().with_max_history(3);

    for i in 0..5 {
        store.save(&format!("s{}", i), &completed_job("fr")).unwrap();
    }

    let history = store.history().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].session_id, "s4");

    // Evicted sessions are gone from disk too
    assert!(store.session("s0").is_none());
    assert!(store.session("s1").is_none());
    assert!(store.session("s4").is_some());
}

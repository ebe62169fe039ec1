/*!
 * End-to-end job orchestration tests against the mock provider
 */

use feedtrans::app_config::CsvConfig;
use feedtrans::csv_processor::CsvProcessor;
use feedtrans::progress::ProgressEvent;
use feedtrans::providers::mock::MockProvider;
use feedtrans::translation::orchestrator::{InputFile, JobRequest};

use crate::common::{orchestrator_with_provider, sample_feed};

fn request(session_id: &str, files: Vec<InputFile>) -> JobRequest {
    JobRequest {
        session_id: session_id.to_string(),
        files,
        test_line_limit: None,
    }
}

fn parse_output(content: &str) -> Vec<Vec<String>> {
    CsvProcessor::new(&CsvConfig::default())
        .parse(content.as_bytes())
        .unwrap()
        .rows
}

#[tokio::test]
async fn test_job_should_translate_every_source_row() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[
        ("title", "Red sweater"),
        ("title", "Blue sweater"),
        ("body_html", "<p>Nice and <strong>warm</strong></p>"),
    ]);

    let summary = orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    assert_eq!(summary.total_lines, 3);
    assert_eq!(summary.total_unique, 3);
    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.files[0].name, "feed_fr.csv");

    // Every source row got its translation; with an echoing provider the
    // target column mirrors the source column
    let rows = parse_output(&summary.files[0].content);
    for row in rows.iter().skip(1) {
        assert_eq!(row[7], row[6]);
    }
}

#[tokio::test]
async fn test_job_should_deduplicate_identical_source_texts() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[
        ("title", "Same text"),
        ("title", "Same text"),
        ("title", "Same text"),
        ("title", "Other text"),
    ]);

    let summary = orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    assert_eq!(summary.total_lines, 4);
    assert_eq!(summary.total_unique, 2);

    // The shared translation still lands on every duplicated row
    let rows = parse_output(&summary.files[0].content);
    assert_eq!(rows[1][7], "Same text");
    assert_eq!(rows[2][7], "Same text");
    assert_eq!(rows[3][7], "Same text");
    assert_eq!(rows[4][7], "Other text");
}

#[tokio::test]
async fn test_job_with_markup_only_cell_should_keep_it_unchanged() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[("body_html", "<div></div>")]);

    let summary = orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    let rows = parse_output(&summary.files[0].content);
    assert_eq!(rows[1][7], "<div></div>");
}

#[tokio::test]
async fn test_job_with_colliding_handles_should_suffix_duplicates() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[("handle", "Blue Backpack!"), ("handle", "Blue  Backpack")]);

    let summary = orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    let rows = parse_output(&summary.files[0].content);
    assert_eq!(rows[1][7], "blue-backpack");
    assert_eq!(rows[2][7], "blue-backpack-001");
}

#[tokio::test(start_paused = true)]
async fn test_job_with_failing_provider_should_complete_with_sentinels() {
    let (orchestrator, _reporter, _temp) =
        orchestrator_with_provider(Box::new(MockProvider::failing("upstream down")));
    let feed = sample_feed(&[("title", "Red sweater"), ("title", "Blue sweater")]);

    let summary = orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .expect("a failed batch must not fail the job");

    let rows = parse_output(&summary.files[0].content);
    for row in rows.iter().skip(1) {
        assert!(row[7].starts_with("[ERREUR:"), "expected sentinel, got {:?}", row[7]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_job_with_transient_failures_should_match_clean_run() {
    let feed = sample_feed(&[("title", "Red sweater")]);

    let (flaky, _r1, _t1) = orchestrator_with_provider(Box::new(
        MockProvider::echo().with_rate_limit_failures(2),
    ));
    let (clean, _r2, _t2) = orchestrator_with_provider(Box::new(MockProvider::echo()));

    let from_flaky = flaky
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed.clone() }]))
        .await
        .unwrap();
    let from_clean = clean
        .run(request("s2", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    assert_eq!(from_flaky.files[0].content, from_clean.files[0].content);
}

#[tokio::test]
async fn test_job_should_emit_lifecycle_events_in_order() {
    let (orchestrator, reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let mut receiver = reporter.attach("s1");
    let feed = sample_feed(&[("title", "Red sweater"), ("title", "Red sweater")]);

    orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }

    assert!(matches!(events[0], ProgressEvent::Connected { .. }));
    match &events[1] {
        ProgressEvent::Init { total_lines, total_unique, deduplication_saved, .. } => {
            assert_eq!(*total_lines, 2);
            assert_eq!(*total_unique, 1);
            assert_eq!(*deduplication_saved, 1);
        }
        other => panic!("expected init, got {:?}", other),
    }
    assert!(matches!(events[2], ProgressEvent::FileStart { .. }));

    // The forced final tick reports 100% before file_complete
    let last_tick = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress(t) => Some(t),
            _ => None,
        })
        .next_back()
        .expect("at least one progress tick");
    assert_eq!(last_tick.percent_complete, 100);

    let tags: Vec<&str> = events
        .iter()
        .map(|e| match e {
            ProgressEvent::Connected { .. } => "connected",
            ProgressEvent::Init { .. } => "init",
            ProgressEvent::FileStart { .. } => "file_start",
            ProgressEvent::Progress(_) => "progress",
            ProgressEvent::FileComplete { .. } => "file_complete",
            ProgressEvent::Complete { .. } => "complete",
            ProgressEvent::Error { .. } => "error",
        })
        .collect();
    let complete_pos = tags.iter().position(|t| *t == "complete").expect("complete event");
    let file_complete_pos = tags.iter().position(|t| *t == "file_complete").expect("file_complete event");
    assert!(file_complete_pos < complete_pos);
    assert!(!tags.contains(&"error"));
}

#[tokio::test]
async fn test_job_with_multiple_files_should_process_sequentially() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let files = vec![
        InputFile { name: "first.csv".to_string(), content: sample_feed(&[("title", "A")]) },
        InputFile { name: "second.csv".to_string(), content: sample_feed(&[("title", "B"), ("title", "C")]) },
    ];

    let summary = orchestrator.run(request("s1", files)).await.unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.files[0].name, "first_fr.csv");
    assert_eq!(summary.files[1].name, "second_fr.csv");
    assert_eq!(summary.files[0].lines_translated, 1);
    assert_eq!(summary.files[1].lines_translated, 2);
    assert_eq!(summary.total_lines, 3);
}

#[tokio::test]
async fn test_job_with_test_line_limit_should_cap_and_rename() {
    let (orchestrator, _reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[("title", "A"), ("title", "B"), ("title", "C")]);

    let summary = orchestrator
        .run(JobRequest {
            session_id: "s1".to_string(),
            files: vec![InputFile { name: "feed.csv".to_string(), content: feed }],
            test_line_limit: Some(2),
        })
        .await
        .unwrap();

    assert_eq!(summary.total_lines, 2);
    assert_eq!(summary.files[0].name, "feed_TEST_fr.csv");

    let rows = parse_output(&summary.files[0].content);
    assert_eq!(rows[1][7], "A");
    assert_eq!(rows[2][7], "B");
    assert_eq!(rows[3][7], "", "capped row must stay untranslated");
}

#[tokio::test]
async fn test_job_with_no_files_should_fail_validation() {
    let (orchestrator, reporter, _temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let mut receiver = reporter.attach("s1");

    let result = orchestrator.run(request("s1", vec![])).await;
    assert!(result.is_err());

    // connected ack, then the terminal error event
    let _ = receiver.try_recv().unwrap();
    let event = receiver.try_recv().unwrap();
    assert!(matches!(event, ProgressEvent::Error { .. }));
}

#[tokio::test]
async fn test_job_should_persist_results_and_clean_incremental_store() {
    let (orchestrator, _reporter, temp) = orchestrator_with_provider(Box::new(MockProvider::echo()));
    let feed = sample_feed(&[("title", "Red sweater")]);

    orchestrator
        .run(request("s1", vec![InputFile { name: "feed.csv".to_string(), content: feed }]))
        .await
        .unwrap();

    // Incremental JSONL files are gone after completion
    let leftovers: Vec<_> = std::fs::read_dir(temp.path().join("incremental"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());

    // The result store kept the output and its metadata
    let results = feedtrans::storage::ResultStore::new(temp.path().join("results")).unwrap();
    let metadata = results.session("s1").expect("saved session");
    assert_eq!(metadata.files.len(), 1);
    assert!(results.file_content("s1", "feed_fr.csv").is_some());
    assert_eq!(results.history().unwrap().len(), 1);
}

/*!
 * Common test utilities shared across the feedtrans test suite
 */

use std::sync::Arc;
use std::time::Duration;

use feedtrans::app_config::{Config, CsvConfig, TranslationCommonConfig, TranslationConfig, TranslationProvider};
use feedtrans::progress::ProgressReporter;
use feedtrans::providers::ChatProvider;
use feedtrans::storage::{IncrementalStore, ResultStore};
use feedtrans::translation::core::TranslationService;
use feedtrans::translation::orchestrator::JobOrchestrator;

/// A test configuration with a known key and fast retries
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.translation = TranslationConfig {
        provider: TranslationProvider::DeepSeek,
        available_providers: Config::default().translation.available_providers,
        common: TranslationCommonConfig {
            retry_count: 3,
            retry_backoff_ms: 10,
            temperature: 0.1,
            max_tokens: 8192,
        },
    };
    config.translation.available_providers[0].api_key = "test-api-key".to_string();
    config.csv = CsvConfig::default();
    config
}

/// A translation service wired to the given provider implementation
pub fn service_with_provider(provider: Box<dyn ChatProvider>) -> TranslationService {
    let config = test_config();
    TranslationService::with_provider(config.translation, "fr", provider)
        .expect("test service should build")
}

/// An orchestrator wired to the given provider, with stores under a temp
/// dir. Returns the orchestrator, the reporter, and the temp dir guard.
pub fn orchestrator_with_provider(
    provider: Box<dyn ChatProvider>,
) -> (JobOrchestrator, Arc<ProgressReporter>, tempfile::TempDir) {
    let config = test_config();
    let service = service_with_provider(provider);
    let reporter = Arc::new(ProgressReporter::new(Duration::from_millis(0)));
    let temp = tempfile::tempdir().expect("temp dir");
    let incremental = IncrementalStore::new(temp.path().join("incremental")).expect("store");
    let results = ResultStore::new(temp.path().join("results")).expect("store");

    let orchestrator =
        JobOrchestrator::with_components(config, service, Arc::clone(&reporter), incremental, results);
    (orchestrator, reporter, temp)
}

/// A small Shopify-style feed: header + rows with the source text in
/// column G (index 6). Field type sits in column C (index 2).
pub fn sample_feed(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut csv = String::from(
        "\"Type\",\"Identification\",\"Field\",\"Locale\",\"Market\",\"Status\",\"Default content\",\"Translated content\"\n",
    );
    for (field, source) in rows {
        csv.push_str(&format!(
            "\"PRODUCT\",\"gid://1\",\"{}\",\"fr\",\"\",\"\",\"{}\",\"\"\n",
            field,
            source.replace('"', "\"\"")
        ));
    }
    csv.into_bytes()
}

/*!
 * Tests for application configuration
 */

use std::str::FromStr;

use feedtrans::app_config::{Config, TranslationProvider};

use crate::common::test_config;

#[test]
fn test_default_config_should_use_deepseek_provider() {
    let config = Config::default();
    assert_eq!(config.translation.provider, TranslationProvider::DeepSeek);
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.get_model(), "deepseek-chat");
    assert_eq!(config.translation.get_endpoint(), "https://api.deepseek.com");
}

#[test]
fn test_default_config_should_have_both_providers_available() {
    let config = Config::default();
    let types: Vec<_> = config
        .translation
        .available_providers
        .iter()
        .map(|p| p.provider_type.as_str())
        .collect();
    assert!(types.contains(&"deepseek"));
    assert!(types.contains(&"openai"));
}

#[test]
fn test_csv_defaults_should_match_shopify_layout() {
    let config = Config::default();
    assert_eq!(config.csv.source_column, 6);
    assert_eq!(config.csv.target_column, 7);
    assert_eq!(config.csv.field_column, 2);
}

#[test]
fn test_validate_with_api_key_should_succeed() {
    let config = test_config();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_with_unsupported_language_should_fail() {
    let mut config = test_config();
    config.target_language = "xx".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_with_missing_api_key_should_fail() {
    let mut config = test_config();
    config.translation.available_providers[0].api_key = String::new();
    // The env fallback must not rescue this test
    unsafe {
        std::env::remove_var("DEEPSEEK_API_KEY");
    }
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_with_same_source_and_target_column_should_fail() {
    let mut config = test_config();
    config.csv.target_column = config.csv.source_column;
    assert!(config.validate().is_err());
}

#[test]
fn test_provider_from_str_should_parse_known_providers() {
    assert_eq!(
        TranslationProvider::from_str("deepseek").unwrap(),
        TranslationProvider::DeepSeek
    );
    assert_eq!(
        TranslationProvider::from_str("OpenAI").unwrap(),
        TranslationProvider::OpenAI
    );
    assert!(TranslationProvider::from_str("mistral").is_err());
}

#[test]
fn test_get_concurrent_requests_should_differ_per_provider() {
    let mut config = test_config();
    assert_eq!(config.translation.get_concurrent_requests(), 300);

    config.translation.provider = TranslationProvider::OpenAI;
    assert_eq!(config.translation.get_concurrent_requests(), 8);
}

#[test]
fn test_config_should_round_trip_through_json() {
    let config = test_config();
    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.target_language, config.target_language);
    assert_eq!(parsed.translation.provider, config.translation.provider);
}

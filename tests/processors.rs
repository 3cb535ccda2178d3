// SPDX-License-Identifier: MIT OR Apache-2.0

mod common;

use common::{init_logging, KeywordClassifier};
use eventflux_elements::core::config::{FlatConfig, PropertySource};
use eventflux_elements::core::element::{Element, ProcessorHost};
use eventflux_elements::core::error::{ErrorConfig, LogLevel};
use eventflux_elements::core::event::{Event, FieldValue};
use eventflux_elements::core::exception::ElementError;
use eventflux_elements::core::processor::{
    LanguageDetection, LanguageDetectionParameters, TextClassifier, TextFilter,
    TextFilterParameters,
};
use eventflux_elements::core::stream::{ChannelCollector, CollectingCollector};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

const PIPELINE_TOML: &str = r#"
[elements.errors-only]
filter.field = "s0::log::level"
filter.operator = "contains"
filter.keyword = "ERR"
error.log-level = "debug"

[elements.language]
language.text-field = "s0::body"
"#;

fn log_line(level: &str, message: &str) -> Event {
    Event::from_json(&json!({"log": {"level": level, "message": message}})).unwrap()
}

#[test]
fn test_filter_configured_from_toml_file() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PIPELINE_TOML.as_bytes()).unwrap();
    let text = std::fs::read_to_string(file.path()).unwrap();

    let config = FlatConfig::from_toml_str(&text, "errors-only").unwrap();
    let error_config = ErrorConfig::from_flat_config(&config).unwrap();
    assert_eq!(error_config.log_level, LogLevel::Debug);

    let out = CollectingCollector::new();
    let mut host = ProcessorHost::new(
        "errors-only",
        TextFilter::new(),
        TextFilterParameters::from_flat_config(&config).unwrap(),
        Box::new(out.clone()),
    )
    .with_error_config(error_config);
    host.start().unwrap();

    host.on_event(log_line("ERROR", "disk full")).unwrap();
    host.on_event(log_line("INFO", "started")).unwrap();
    host.on_event(log_line("err", "lowercase does not match")).unwrap();
    host.on_event(log_line("STDERR", "substring")).unwrap();
    host.stop().unwrap();

    let levels: Vec<_> = out
        .snapshot()
        .iter()
        .map(|e| {
            e.get_path(&["log", "level"])
                .and_then(FieldValue::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(levels, vec!["ERROR", "STDERR"]);
}

#[test]
fn test_pipeline_override_beats_file() {
    let mut config = FlatConfig::from_toml_str(PIPELINE_TOML, "errors-only").unwrap();
    config.set("filter.operator", "equals", PropertySource::Pipeline);
    config.set("filter.keyword", "ERROR", PropertySource::Pipeline);

    let params = TextFilterParameters::from_flat_config(&config).unwrap();
    assert_eq!(params.keyword, "ERROR");

    let out = CollectingCollector::new();
    let mut host = ProcessorHost::new("errors-only", TextFilter::new(), params, Box::new(out.clone()));
    host.start().unwrap();
    host.on_event(log_line("STDERR", "no longer matches")).unwrap();
    host.on_event(log_line("ERROR", "matches")).unwrap();

    assert_eq!(out.len(), 1);
}

#[test]
fn test_missing_element_table() {
    let err = FlatConfig::from_toml_str(PIPELINE_TOML, "unknown").unwrap_err();
    assert!(matches!(err, ElementError::Configuration { .. }));
}

#[test]
fn test_language_enrichment_through_channel() {
    init_logging();
    let config = FlatConfig::from_toml_str(PIPELINE_TOML, "language").unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut host = ProcessorHost::new(
        "language",
        LanguageDetection::new(Arc::new(KeywordClassifier)),
        LanguageDetectionParameters::from_flat_config(&config).unwrap(),
        Box::new(ChannelCollector::new(tx)),
    );
    host.start().unwrap();

    host.on_event(
        Event::new()
            .with_field("id", 1i64)
            .with_field("body", "Der Hund und die Katze"),
    )
    .unwrap();
    host.on_event(Event::new().with_field("id", 2i64).with_field("body", "the weather is fine"))
        .unwrap();
    host.on_event(Event::new().with_field("id", 3i64)).unwrap();
    host.stop().unwrap();

    let enriched: Vec<_> = rx.try_iter().map(|e| e.to_json().unwrap()).collect();
    assert_eq!(
        enriched,
        vec![
            json!({"id": 1, "body": "Der Hund und die Katze", "language": "deu", "confidence": 0.92}),
            json!({"id": 2, "body": "the weather is fine", "language": "eng", "confidence": 0.55}),
        ]
    );
    assert_eq!(host.stats().events_dropped, 1);
}

#[test]
fn test_classifier_load_failure_prevents_construction() {
    let result = LanguageDetection::try_new(|| -> Result<Arc<dyn TextClassifier>, String> {
        Err("profile directory not found".to_string())
    });

    assert!(matches!(
        result,
        Err(ElementError::InitializationFailed { .. })
    ));
}

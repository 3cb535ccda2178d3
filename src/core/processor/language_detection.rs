// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language detection: enriches each event in place with the language of one
//! of its text fields.
//!
//! The classifier is loaded once, when the element is constructed. A loader
//! failure surfaces from [`LanguageDetection::try_new`], before the element
//! can be started.
//!
//! # Parameters
//! - `language.text-field` (required): selector of the text to classify
//!
//! # Output
//! The input event plus `language` (string) and `confidence` (float).

use super::EventProcessor;
use crate::core::config::FlatConfig;
use crate::core::event::{Event, FieldSelector, PrimitiveType};
use crate::core::exception::{ElementError, ElementResult};
use crate::core::stream::output::collector::EventCollector;
use std::fmt::Debug;
use std::sync::Arc;

pub const LANGUAGE_KEY: &str = "language";
pub const CONFIDENCE_KEY: &str = "confidence";

/// Best-effort label for a piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// External scorer. Side-effect free and total: it always returns a label.
pub trait TextClassifier: Debug + Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

#[derive(Debug, Clone)]
pub struct LanguageDetectionParameters {
    pub text_field: FieldSelector,
}

impl LanguageDetectionParameters {
    pub fn new(text_field: FieldSelector) -> Self {
        Self { text_field }
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let text_field = FieldSelector::parse(
            config.get_required("language.text-field")?,
            PrimitiveType::String,
        )?;
        Ok(Self { text_field })
    }
}

#[derive(Debug)]
pub struct LanguageDetection {
    classifier: Arc<dyn TextClassifier>,
    text_field: Option<FieldSelector>,
}

impl LanguageDetection {
    /// Use an already initialized classifier
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            classifier,
            text_field: None,
        }
    }

    /// Load the classifier, turning a loader failure into an initialization error
    pub fn try_new<F, E>(loader: F) -> ElementResult<Self>
    where
        F: FnOnce() -> Result<Arc<dyn TextClassifier>, E>,
        E: std::fmt::Display,
    {
        let classifier = loader().map_err(|e| {
            ElementError::initialization_failed_with_component(
                format!("Failed to load language model: {}", e),
                "LanguageDetection",
            )
        })?;
        Ok(Self::new(classifier))
    }
}

impl EventProcessor for LanguageDetection {
    type Parameters = LanguageDetectionParameters;

    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()> {
        self.text_field = Some(parameters.text_field);
        Ok(())
    }

    fn on_event(&mut self, mut event: Event, collector: &mut dyn EventCollector) -> ElementResult<()> {
        let text_field = self.text_field.as_ref().ok_or_else(|| {
            ElementError::lifecycle_violation("LanguageDetection", "on_event", "not started")
        })?;

        let classification = self.classifier.classify(text_field.resolve_string(&event)?);

        event.add_field(LANGUAGE_KEY, classification.label);
        event.add_field(CONFIDENCE_KEY, classification.confidence);
        collector.collect(event);
        Ok(())
    }

    fn on_pipeline_stopped(&mut self) -> ElementResult<()> {
        self.text_field = None;
        Ok(())
    }
}

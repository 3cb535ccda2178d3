// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event processors: filter, enrich or derive events and emit them downstream.
//!
//! | Processor | Emits |
//! |-----------|-------|
//! | [`TextFilter`] | the input event, when its text field matches |
//! | [`LanguageDetection`] | the input event plus `language` and `confidence` |
//! | [`TaskDuration`] | one `{processId, duration}` event per key transition |

pub mod language_detection;
pub mod task_duration;
pub mod text_filter;

pub use language_detection::{
    Classification, LanguageDetection, LanguageDetectionParameters, TextClassifier,
};
pub use task_duration::{TaskDuration, TaskDurationParameters};
pub use text_filter::{StringOperator, TextFilter, TextFilterParameters};

use crate::core::event::Event;
use crate::core::exception::ElementResult;
use crate::core::stream::output::collector::EventCollector;
use std::fmt::Debug;

/// Contract every processing element implements.
///
/// Calls arrive one at a time from a single thread, so implementations keep
/// their runtime state in plain fields without locking.
pub trait EventProcessor: Debug + Send {
    /// Immutable configuration produced before the element starts
    type Parameters: Debug + Clone + Send;

    /// Build runtime state; an error aborts pipeline start
    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()>;

    /// Process one event, emitting zero or more events into `collector`
    fn on_event(&mut self, event: Event, collector: &mut dyn EventCollector) -> ElementResult<()>;

    /// Discard runtime state; must tolerate a partially failed start
    fn on_pipeline_stopped(&mut self) -> ElementResult<()>;
}

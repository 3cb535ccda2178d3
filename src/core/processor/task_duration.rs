// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Task Duration
//!
//! Watches a key field across the ordered event stream and, whenever its value
//! changes, emits one derived event with the time spent since the previous
//! change:
//!
//! ```text
//! key:  A   A   B   B   B   C
//! ts:   0  10  20  30  40  50
//!               │           │
//!               ▼           ▼
//!     {processId: "A-B", duration: 20.0}
//!                 {processId: "B-C", duration: 30.0}
//! ```
//!
//! The first event only records state. Repeated keys leave the recorded
//! timestamp untouched, so a duration always spans transition to transition.
//! Timestamps are not checked for monotonicity: an out-of-order stream yields
//! negative durations.
//!
//! # Parameters
//! - `task.field` (required): selector of the key field
//! - `task.timestamp-field` (required): selector of the timestamp (long)
//! - `task.divisor`: positive divisor applied to the raw difference
//! - `task.output-unit`: `milliseconds` (default), `seconds` or `minutes`;
//!   ignored when `task.divisor` is set

use super::EventProcessor;
use crate::core::config::FlatConfig;
use crate::core::event::{Event, FieldSelector, PrimitiveType};
use crate::core::exception::{ElementError, ElementResult};
use crate::core::stream::output::collector::EventCollector;

pub const PROCESS_ID_KEY: &str = "processId";
pub const DURATION_KEY: &str = "duration";
const PROCESS_ID_SEPARATOR: &str = "-";

#[derive(Debug, Clone)]
pub struct TaskDurationParameters {
    pub task_field: FieldSelector,
    pub timestamp_field: FieldSelector,
    pub output_divisor: f64,
}

impl TaskDurationParameters {
    pub fn new(
        task_field: FieldSelector,
        timestamp_field: FieldSelector,
        output_divisor: f64,
    ) -> ElementResult<Self> {
        if !(output_divisor.is_finite() && output_divisor > 0.0) {
            return Err(ElementError::invalid_parameter_with_details(
                format!("Output divisor must be positive, got {}", output_divisor),
                "task.divisor",
                "finite number > 0",
            ));
        }
        Ok(Self {
            task_field,
            timestamp_field,
            output_divisor,
        })
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let task_field = FieldSelector::parse(config.get_required("task.field")?, PrimitiveType::String)?;
        let timestamp_field = FieldSelector::parse(
            config.get_required("task.timestamp-field")?,
            PrimitiveType::Long,
        )?;

        let output_divisor = match config.get_parsed::<f64>("task.divisor")? {
            Some(divisor) => divisor,
            None => divisor_for_unit(config.get("task.output-unit").unwrap_or("milliseconds"))?,
        };

        Self::new(task_field, timestamp_field, output_divisor)
    }
}

fn divisor_for_unit(unit: &str) -> ElementResult<f64> {
    match unit.trim().to_lowercase().as_str() {
        "milliseconds" | "ms" => Ok(1.0),
        "seconds" | "s" => Ok(1000.0),
        "minutes" | "min" => Ok(60_000.0),
        _ => Err(ElementError::invalid_parameter_with_details(
            format!("Unknown output unit '{}'", unit),
            "task.output-unit",
            "'milliseconds', 'seconds' or 'minutes'",
        )),
    }
}

/// Key and timestamp recorded at the last transition
#[derive(Debug, Clone, PartialEq)]
struct LastTransition {
    task: String,
    timestamp: i64,
}

#[derive(Debug, Default)]
pub struct TaskDuration {
    parameters: Option<TaskDurationParameters>,
    last: Option<LastTransition>,
}

impl TaskDuration {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_id(last_task: &str, task: &str) -> String {
        format!("{}{}{}", last_task, PROCESS_ID_SEPARATOR, task)
    }
}

impl EventProcessor for TaskDuration {
    type Parameters = TaskDurationParameters;

    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()> {
        self.parameters = Some(parameters);
        self.last = None;
        Ok(())
    }

    fn on_event(&mut self, event: Event, collector: &mut dyn EventCollector) -> ElementResult<()> {
        let params = self
            .parameters
            .as_ref()
            .ok_or_else(|| ElementError::lifecycle_violation("TaskDuration", "on_event", "not started"))?;

        let task = params.task_field.resolve_string(&event)?;
        let timestamp = params.timestamp_field.resolve_long(&event)?;

        match self.last.as_mut() {
            None => {
                self.last = Some(LastTransition {
                    task: task.to_string(),
                    timestamp,
                });
            }
            Some(last) if last.task == task => {}
            Some(last) => {
                let duration = timestamp.wrapping_sub(last.timestamp) as f64 / params.output_divisor;
                let derived = Event::new()
                    .with_field(PROCESS_ID_KEY, Self::process_id(&last.task, task))
                    .with_field(DURATION_KEY, duration);

                last.task = task.to_string();
                last.timestamp = timestamp;
                collector.collect(derived);
            }
        }
        Ok(())
    }

    fn on_pipeline_stopped(&mut self) -> ElementResult<()> {
        self.last = None;
        self.parameters = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PropertySource;
    use crate::core::event::FieldValue;
    use crate::core::stream::output::collector::CollectingCollector;

    fn params(divisor: f64) -> TaskDurationParameters {
        TaskDurationParameters::new(
            FieldSelector::parse("s0::task", PrimitiveType::String).unwrap(),
            FieldSelector::parse("s0::ts", PrimitiveType::Long).unwrap(),
            divisor,
        )
        .unwrap()
    }

    fn event(task: &str, ts: i64) -> Event {
        Event::new().with_field("task", task).with_field("ts", ts)
    }

    fn feed(element: &mut TaskDuration, out: &mut CollectingCollector, input: &[(&str, i64)]) {
        for (task, ts) in input {
            element.on_event(event(task, *ts), out).unwrap();
        }
    }

    fn summary(events: &[Event]) -> Vec<(String, f64)> {
        events
            .iter()
            .map(|e| {
                (
                    e.get(PROCESS_ID_KEY).and_then(FieldValue::as_str).unwrap().to_string(),
                    e.get(DURATION_KEY).and_then(FieldValue::as_float).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_transitions_only() {
        let mut element = TaskDuration::new();
        element.on_pipeline_started(params(1.0)).unwrap();
        let mut out = CollectingCollector::new();

        feed(
            &mut element,
            &mut out,
            &[("A", 0), ("A", 10), ("B", 20), ("B", 30), ("B", 40), ("C", 50)],
        );

        assert_eq!(
            summary(&out.snapshot()),
            vec![("A-B".to_string(), 20.0), ("B-C".to_string(), 30.0)]
        );
    }

    #[test]
    fn test_derived_event_has_only_output_fields() {
        let mut element = TaskDuration::new();
        element.on_pipeline_started(params(1.0)).unwrap();
        let mut out = CollectingCollector::new();

        feed(&mut element, &mut out, &[("A", 0), ("B", 5)]);

        let derived = out.drain().pop().unwrap();
        assert_eq!(
            derived.field_names().collect::<Vec<_>>(),
            vec![PROCESS_ID_KEY, DURATION_KEY]
        );
    }

    #[test]
    fn test_divisor_scales_duration() {
        let mut element = TaskDuration::new();
        element.on_pipeline_started(params(1000.0)).unwrap();
        let mut out = CollectingCollector::new();

        feed(&mut element, &mut out, &[("idle", 1_000), ("busy", 3_500)]);

        assert_eq!(summary(&out.snapshot()), vec![("idle-busy".to_string(), 2.5)]);
    }

    #[test]
    fn test_out_of_order_timestamps_give_negative_duration() {
        let mut element = TaskDuration::new();
        element.on_pipeline_started(params(1.0)).unwrap();
        let mut out = CollectingCollector::new();

        feed(&mut element, &mut out, &[("A", 100), ("B", 40)]);

        assert_eq!(summary(&out.snapshot()), vec![("A-B".to_string(), -60.0)]);
    }

    #[test]
    fn test_restart_forgets_history() {
        let input = [("A", 0), ("A", 10), ("B", 20), ("C", 50)];
        let mut element = TaskDuration::new();
        let mut out = CollectingCollector::new();

        element.on_pipeline_started(params(1.0)).unwrap();
        feed(&mut element, &mut out, &input);
        let first_run = out.drain();
        element.on_pipeline_stopped().unwrap();

        element.on_pipeline_started(params(1.0)).unwrap();
        feed(&mut element, &mut out, &input);
        let second_run = out.drain();

        assert_eq!(first_run, second_run);
        assert_eq!(summary(&second_run)[0], ("A-B".to_string(), 20.0));
    }

    #[test]
    fn test_unresolvable_event_leaves_state_untouched() {
        let mut element = TaskDuration::new();
        element.on_pipeline_started(params(1.0)).unwrap();
        let mut out = CollectingCollector::new();

        feed(&mut element, &mut out, &[("A", 0)]);
        let bad = Event::new().with_field("task", "B").with_field("ts", "late");
        assert!(element.on_event(bad, &mut out).unwrap_err().is_resolution_error());
        feed(&mut element, &mut out, &[("B", 7)]);

        assert_eq!(summary(&out.snapshot()), vec![("A-B".to_string(), 7.0)]);
    }

    #[test]
    fn test_parameters_from_flat_config() {
        let mut config = FlatConfig::new();
        config.set("task.field", "s0::machine::state", PropertySource::Pipeline);
        config.set("task.timestamp-field", "s0::timestamp", PropertySource::Pipeline);
        config.set("task.output-unit", "seconds", PropertySource::Pipeline);

        let params = TaskDurationParameters::from_flat_config(&config).unwrap();
        assert_eq!(params.output_divisor, 1000.0);

        config.set("task.divisor", "0", PropertySource::Pipeline);
        assert!(TaskDurationParameters::from_flat_config(&config).is_err());
    }
}

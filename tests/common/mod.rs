// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use eventflux_elements::core::event::Event;
use eventflux_elements::core::exception::{ElementError, ElementResult};
use eventflux_elements::core::processor::{Classification, TextClassifier};
use eventflux_elements::core::stream::output::sink::{
    BatchStore, BrokerConnection, BrokerConnector,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn reading(sensor: &str, ts: i64) -> Event {
    Event::new()
        .with_field("sensor", sensor)
        .with_field("timestamp", ts)
}

/// Batch store that records every written batch and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    pub batches: Arc<Mutex<Vec<Vec<Event>>>>,
    pub failing: Arc<AtomicBool>,
    pub attempts: Arc<AtomicUsize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn written(&self) -> Vec<Event> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

impl BatchStore for RecordingStore {
    fn write_batch(&mut self, events: &[Event]) -> ElementResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ElementError::store_write_failed("store offline"));
        }
        self.batches.lock().unwrap().push(events.to_vec());
        Ok(())
    }
}

/// Broker double shared between the connector and the test.
#[derive(Debug, Default)]
pub struct BrokerState {
    pub published: Vec<Vec<u8>>,
    pub connects: usize,
    pub disconnects: usize,
    pub refuse_connect: bool,
    /// Number of upcoming publishes that fail
    pub failing_publishes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<BrokerState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_json(&self) -> Vec<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
            .collect()
    }
}

impl BrokerConnector for FakeConnector {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        _destination: &str,
    ) -> ElementResult<Box<dyn BrokerConnection>> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connect {
            return Err(ElementError::connection_unavailable(format!(
                "connection refused by {}:{}",
                host, port
            )));
        }
        state.connects += 1;
        Ok(Box::new(FakeConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct FakeConnection {
    state: Arc<Mutex<BrokerState>>,
}

impl BrokerConnection for FakeConnection {
    fn publish(&mut self, payload: &[u8]) -> ElementResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_publishes > 0 {
            state.failing_publishes -= 1;
            return Err(ElementError::publish_failed("broker rejected message"));
        }
        state.published.push(payload.to_vec());
        Ok(())
    }

    fn disconnect(&mut self) -> ElementResult<()> {
        self.state.lock().unwrap().disconnects += 1;
        Ok(())
    }
}

/// Classifier keyed on a few marker words; everything else is English.
#[derive(Debug)]
pub struct KeywordClassifier;

impl TextClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();
        if lower.contains("der") || lower.contains("und") {
            Classification::new("deu", 0.92)
        } else if lower.contains("le ") || lower.contains("et ") {
            Classification::new("fra", 0.81)
        } else {
            Classification::new("eng", 0.55)
        }
    }
}

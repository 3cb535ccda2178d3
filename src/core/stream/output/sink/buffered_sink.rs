// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Buffered Sink
//!
//! Decouples the event arrival rate from the per-write cost of an external
//! store by writing events in batches.
//!
//! ```text
//! on_event ──▶ [ pending buffer ] ──write_batch()──▶ BatchStore
//!                     ▲
//!      flush timer ───┘  (every tick: flush if the oldest event is older than T)
//! ```
//!
//! A batch is written when the buffer holds `batch_size` events, or when the
//! first buffered event has waited `flush_interval`. Both triggers run under
//! the same mutex, so append, threshold check, write and clear never
//! interleave.
//!
//! A failed write keeps every buffered event in order and restarts the age
//! clock. The failure is returned from the call that triggered the flush;
//! timer flush failures are logged and returned from the next `on_event` or
//! `on_pipeline_stopped`.
//!
//! # Parameters
//! - `buffer.batch-size` (required): events per batch, > 0
//! - `buffer.flush-interval-ms`: maximum age of a buffered event (default:
//!   2000, `0` disables the timer)

use super::sink_trait::EventSink;
use crate::core::config::FlatConfig;
use crate::core::event::Event;
use crate::core::exception::{ElementError, ElementResult};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2000;
const MAX_TIMER_TICK: Duration = Duration::from_millis(250);

/// External store that accepts whole batches.
pub trait BatchStore: Debug + Send {
    /// Write all events or none of them
    fn write_batch(&mut self, events: &[Event]) -> ElementResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedSinkParameters {
    pub batch_size: usize,
    /// `None` disables time-triggered flushes
    pub flush_interval: Option<Duration>,
}

impl BufferedSinkParameters {
    pub fn new(batch_size: usize, flush_interval: Option<Duration>) -> ElementResult<Self> {
        if batch_size == 0 {
            return Err(ElementError::invalid_parameter_with_details(
                "Batch size must be greater than 0",
                "buffer.batch-size",
                "positive integer",
            ));
        }
        if flush_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ElementError::invalid_parameter_with_details(
                "Flush interval must be greater than 0",
                "buffer.flush-interval-ms",
                "positive duration",
            ));
        }
        Ok(Self {
            batch_size,
            flush_interval,
        })
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let batch_size = config.get_required_parsed::<usize>("buffer.batch-size")?;
        let interval_ms = config
            .get_parsed::<u64>("buffer.flush-interval-ms")?
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);
        let flush_interval = (interval_ms > 0).then(|| Duration::from_millis(interval_ms));

        Self::new(batch_size, flush_interval)
    }
}

/// Everything guarded by the buffer mutex
#[derive(Debug)]
struct Buffer<S> {
    store: S,
    pending: Vec<Event>,
    /// Arrival time of the oldest pending event
    created_at: Option<Instant>,
    timer_error: Option<ElementError>,
    flushed_batches: u64,
}

impl<S: BatchStore> Buffer<S> {
    fn new(store: S) -> Self {
        Self {
            store,
            pending: Vec::new(),
            created_at: None,
            timer_error: None,
            flushed_batches: 0,
        }
    }

    fn push(&mut self, event: Event) {
        if self.pending.is_empty() {
            self.created_at = Some(Instant::now());
        }
        self.pending.push(event);
    }

    fn is_due(&self, interval: Duration, now: Instant) -> bool {
        self.created_at
            .is_some_and(|created| now.saturating_duration_since(created) >= interval)
    }

    fn flush(&mut self) -> ElementResult<()> {
        if self.pending.is_empty() {
            self.created_at = None;
            return Ok(());
        }

        match self.store.write_batch(&self.pending) {
            Ok(()) => {
                log::debug!("[BufferedSink] Flushed {} events", self.pending.len());
                self.pending.clear();
                self.created_at = None;
                self.flushed_batches += 1;
                // A failure already retried successfully is stale
                self.timer_error = None;
                Ok(())
            }
            Err(e) => {
                self.created_at = Some(Instant::now());
                Err(ElementError::flush_failed(self.pending.len(), e))
            }
        }
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.created_at = None;
        self.timer_error = None;
    }
}

fn lock<S>(shared: &Mutex<Buffer<S>>) -> ElementResult<MutexGuard<'_, Buffer<S>>> {
    shared
        .lock()
        .map_err(|_| ElementError::runtime("Buffer lock poisoned"))
}

/// Background thread that flushes the buffer once it has aged past the interval
#[derive(Debug)]
struct FlushTimer {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushTimer {
    fn spawn<S: BatchStore + 'static>(
        shared: Arc<Mutex<Buffer<S>>>,
        interval: Duration,
    ) -> ElementResult<Self> {
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let tick = (interval / 4).clamp(Duration::from_millis(1), MAX_TIMER_TICK);

        let handle = thread::Builder::new()
            .name("buffered-sink-flush".to_string())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(tick) {
                    Err(RecvTimeoutError::Timeout) => {
                        let mut buffer = match lock(&shared) {
                            Ok(buffer) => buffer,
                            Err(e) => {
                                log::error!("[BufferedSink] Flush timer exiting: {}", e);
                                break;
                            }
                        };
                        if buffer.is_due(interval, Instant::now()) {
                            if let Err(e) = buffer.flush() {
                                log::error!("[BufferedSink] Timed flush failed: {}", e);
                                buffer.timer_error = Some(e);
                            }
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| {
                ElementError::initialization_failed_with_component(
                    format!("Failed to spawn flush timer: {}", e),
                    "BufferedSink",
                )
            })?;

        Ok(Self { shutdown, handle })
    }

    fn stop(self) {
        let _ = self.shutdown.send(());
        if self.handle.join().is_err() {
            log::error!("[BufferedSink] Flush timer panicked");
        }
    }
}

/// Sink adapter that batches events for a [`BatchStore`].
#[derive(Debug)]
pub struct BufferedSink<S: BatchStore + 'static> {
    shared: Arc<Mutex<Buffer<S>>>,
    parameters: Option<BufferedSinkParameters>,
    timer: Option<FlushTimer>,
}

impl<S: BatchStore + 'static> BufferedSink<S> {
    pub fn new(store: S) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Buffer::new(store))),
            parameters: None,
            timer: None,
        }
    }

    /// Number of events waiting for the next flush
    pub fn pending_len(&self) -> usize {
        lock(&self.shared).map(|b| b.pending.len()).unwrap_or(0)
    }

    /// Number of batches successfully written since construction
    pub fn flushed_batches(&self) -> u64 {
        lock(&self.shared).map(|b| b.flushed_batches).unwrap_or(0)
    }

    /// Hand the unflushed events to the caller, e.g. after a failed final flush
    pub fn take_pending(&self) -> ElementResult<Vec<Event>> {
        let mut buffer = lock(&self.shared)?;
        buffer.created_at = None;
        Ok(std::mem::take(&mut buffer.pending))
    }

    /// Flush now, regardless of thresholds
    pub fn flush(&self) -> ElementResult<()> {
        lock(&self.shared)?.flush()
    }
}

impl<S: BatchStore + 'static> EventSink for BufferedSink<S> {
    type Parameters = BufferedSinkParameters;

    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()> {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }

        {
            let mut buffer = lock(&self.shared)?;
            if !buffer.pending.is_empty() {
                log::warn!(
                    "[BufferedSink] Discarding {} events left from a previous run",
                    buffer.pending.len()
                );
            }
            buffer.reset();
        }

        if let Some(interval) = parameters.flush_interval {
            self.timer = Some(FlushTimer::spawn(Arc::clone(&self.shared), interval)?);
        }

        log::info!(
            "[BufferedSink] Buffering up to {} events, flush interval {:?}",
            parameters.batch_size,
            parameters.flush_interval
        );
        self.parameters = Some(parameters);
        Ok(())
    }

    fn on_event(&mut self, event: Event) -> ElementResult<()> {
        let batch_size = self
            .parameters
            .as_ref()
            .map(|p| p.batch_size)
            .ok_or_else(|| ElementError::lifecycle_violation("BufferedSink", "on_event", "not started"))?;

        let mut buffer = lock(&self.shared)?;
        buffer.push(event);
        if buffer.pending.len() >= batch_size {
            buffer.flush()?;
        }
        match buffer.timer_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn on_pipeline_stopped(&mut self) -> ElementResult<()> {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
        let was_started = self.parameters.take().is_some();

        let mut buffer = lock(&self.shared)?;
        if let Some(e) = buffer.timer_error.take() {
            log::warn!("[BufferedSink] Earlier timed flush failed: {}", e);
        }
        if was_started {
            // Events stay buffered on failure so the caller can take them
            buffer.flush()?;
        }
        Ok(())
    }
}

impl<S: BatchStore + 'static> Drop for BufferedSink<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }
}

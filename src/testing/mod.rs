//! Testing utilities for users of the tempo library.
//!
//! This module provides helpers for testing hosts that integrate the
//! scheduler service:
//!
//! - [`MockEngine`]: an in-process engine with manual notification emission
//!   and injectable startup faults
//! - [`RecordingSubscriber`]: records every notification it receives
//! - [`CountingSubscriber`]: counts notifications across any channel

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::ValueProcessor;
use crate::engine::{Engine, EngineError, EngineRun};
use crate::events::{
    ExecutionError, LoadingError, NotificationSink, Subscriber, TaskDue,
};

/// An in-process engine for tests.
///
/// The monitoring run idles until it is stopped or cancelled; notifications
/// are raised manually through the `emit_*` helpers, which drive every
/// attached sink the way a real engine would.
pub struct MockEngine {
    tick_interval: Mutex<Duration>,
    processors: Mutex<HashMap<String, ValueProcessor>>,
    sinks: Mutex<Vec<Arc<dyn NotificationSink>>>,
    halt: Mutex<CancellationToken>,
    fail_start: AtomicBool,
    start_count: AtomicU32,
}

impl MockEngine {
    /// Polling interval the engine keeps unless overridden.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// Create an idle engine with the default tick interval.
    pub fn new() -> Self {
        Self {
            tick_interval: Mutex::new(Self::DEFAULT_TICK_INTERVAL),
            processors: Mutex::new(HashMap::new()),
            sinks: Mutex::new(Vec::new()),
            halt: Mutex::new(CancellationToken::new()),
            fail_start: AtomicBool::new(false),
            start_count: AtomicU32::new(0),
        }
    }

    /// Make the next `start` call fail with a source error.
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Number of accepted `start` calls.
    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::SeqCst)
    }

    fn sinks_snapshot(&self) -> Vec<Arc<dyn NotificationSink>> {
        self.sinks.lock().expect("sink list lock poisoned").clone()
    }

    /// Raise a task-due notification on every attached sink.
    pub async fn emit_task_due(&self, event: TaskDue) {
        for sink in self.sinks_snapshot() {
            sink.task_due(event.clone()).await;
        }
    }

    /// Raise an execution-error notification on every attached sink.
    pub async fn emit_execution_error(&self, event: ExecutionError) {
        for sink in self.sinks_snapshot() {
            sink.execution_error(event.clone()).await;
        }
    }

    /// Raise a loading-error notification on every attached sink.
    pub async fn emit_loading_error(&self, event: LoadingError) {
        for sink in self.sinks_snapshot() {
            sink.loading_error(event.clone()).await;
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn start(&self, cancel: CancellationToken) -> Result<EngineRun, EngineError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(EngineError::Source("task source unreachable".into()));
        }

        let halt = CancellationToken::new();
        *self.halt.lock().expect("halt token lock poisoned") = halt.clone();
        self.start_count.fetch_add(1, Ordering::SeqCst);

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = halt.cancelled() => {}
            }
            Ok(())
        }))
    }

    async fn stop(&self) {
        self.halt
            .lock()
            .expect("halt token lock poisoned")
            .cancel();
    }

    fn set_tick_interval(&self, interval: Duration) {
        *self
            .tick_interval
            .lock()
            .expect("tick interval lock poisoned") = interval;
    }

    fn tick_interval(&self) -> Duration {
        *self
            .tick_interval
            .lock()
            .expect("tick interval lock poisoned")
    }

    fn add_value_processor(&self, name: &str, processor: ValueProcessor) -> bool {
        let mut processors = self
            .processors
            .lock()
            .expect("processor registry lock poisoned");
        if processors.contains_key(name) {
            return false;
        }
        processors.insert(name.to_string(), processor);
        true
    }

    fn value_processor(&self, name: &str) -> Option<ValueProcessor> {
        self.processors
            .lock()
            .expect("processor registry lock poisoned")
            .get(name)
            .cloned()
    }

    fn attach(&self, sink: Arc<dyn NotificationSink>) {
        self.sinks
            .lock()
            .expect("sink list lock poisoned")
            .push(sink);
    }
}

/// Subscriber that records every notification it receives.
pub struct RecordingSubscriber<E> {
    events: tokio::sync::Mutex<Vec<E>>,
}

impl<E: Clone + Send + Sync> RecordingSubscriber<E> {
    /// Create a recording subscriber.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    /// The notifications received so far, in delivery order.
    pub async fn events(&self) -> Vec<E> {
        self.events.lock().await.clone()
    }

    /// Number of notifications received so far.
    pub async fn count(&self) -> usize {
        self.events.lock().await.len()
    }

    /// Poll until `expected` notifications have arrived.
    ///
    /// # Panics
    ///
    /// Panics if the timeout is reached first.
    pub async fn wait_for(&self, expected: usize, timeout: Duration) {
        let start = tokio::time::Instant::now();
        loop {
            if self.count().await >= expected {
                return;
            }
            if start.elapsed() > timeout {
                panic!(
                    "timed out waiting for {} notifications, saw {}",
                    expected,
                    self.count().await
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> Subscriber<E> for RecordingSubscriber<E> {
    async fn notify(&self, event: &E) {
        self.events.lock().await.push(event.clone());
    }
}

/// Subscriber that counts notifications on any channel.
pub struct CountingSubscriber {
    count: AtomicU32,
}

impl CountingSubscriber {
    /// Create a counting subscriber.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicU32::new(0),
        })
    }

    /// Number of notifications received so far.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Send + Sync> Subscriber<E> for CountingSubscriber {
    async fn notify(&self, _event: &E) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

//! Engine collaborator contract.
//!
//! The scheduling engine itself lives outside this crate: it computes due
//! times, executes tasks, and loads task definitions from the source named
//! by `config_path`. The adapter only needs the surface defined here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ValueProcessor;
use crate::events::NotificationSink;

/// Errors reported by the engine across the adapter boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The task source could not be read at startup.
    #[error("task source unavailable: {0}")]
    Source(String),

    /// The monitoring run hit an unrecoverable fault.
    #[error("engine fault: {0}")]
    Fault(String),
}

/// A monitoring run in progress; resolves when the run terminates.
pub type EngineRun = JoinHandle<Result<(), EngineError>>;

/// Contract the wrapped scheduling engine must satisfy.
///
/// One engine instance is owned by exactly one service and is never shared
/// across services; it is started and stopped, never replaced.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Begin monitoring scheduled tasks.
    ///
    /// Returns once the engine has accepted the start request. The returned
    /// handle resolves when the run terminates: through [`stop`](Engine::stop),
    /// through the cancellation token (observed at the engine's own polling
    /// granularity), or through an unrecoverable fault.
    async fn start(&self, cancel: CancellationToken) -> Result<EngineRun, EngineError>;

    /// Request graceful termination of the current run.
    ///
    /// The engine stops raising due-task triggers and lets in-flight task
    /// executions finish before the run resolves. Safe to call when no run
    /// is active.
    async fn stop(&self);

    /// Override the polling interval.
    fn set_tick_interval(&self, interval: Duration);

    /// The current polling interval.
    fn tick_interval(&self) -> Duration;

    /// Insert a value processor unless the name is already registered.
    ///
    /// Returns `true` when the processor was inserted, `false` when an
    /// existing entry with the same name was kept.
    fn add_value_processor(&self, name: &str, processor: ValueProcessor) -> bool;

    /// Look up a registered value processor by name.
    fn value_processor(&self, name: &str) -> Option<ValueProcessor>;

    /// Add a sink to the engine's own observer list.
    ///
    /// The engine awaits each sink call before raising the next
    /// notification on that category.
    fn attach(&self, sink: Arc<dyn NotificationSink>);
}

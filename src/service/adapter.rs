//! Scheduler service implementation.
//!
//! The service is responsible for:
//! - Validating options and constructing the engine handle exactly once
//! - Merging configured value processors into the engine's registry
//! - Running the engine's monitoring loop as one cancellable unit of work
//! - Re-exposing the engine's notifications to host subscribers

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::{ContractVersion, ServiceOptions};
use crate::core::types::RunId;
use crate::engine::{Engine, EngineError};
use crate::events::{
    ErrorEvent, EventRelay, ExecutionError, LoadingError, NotificationSink, Subscriber,
    SubscriptionId, TaskDue,
};

use super::types::{ServiceError, ServiceState};

/// Adapter exposing one scheduling engine through a stable lifecycle and
/// event surface.
///
/// Configuration is immutable for the service's lifetime: the options are
/// consumed by [`connect`](SchedulerService::connect) and never re-read.
pub struct SchedulerService<E> {
    engine: Arc<E>,
    relay: Arc<EventRelay>,
    state: Arc<RwLock<ServiceState>>,
}

impl<E: Engine> SchedulerService<E> {
    /// Validate `options`, construct the engine handle through `factory`,
    /// and wire the event relay into the engine's observer list.
    ///
    /// Validation runs before `factory` is invoked, so invalid options can
    /// never leave a partially-initialized engine behind. The factory
    /// receives the validated task-source path.
    pub fn connect<F>(options: ServiceOptions, factory: F) -> Result<Self, ServiceError>
    where
        F: FnOnce(&str) -> Result<E, EngineError>,
    {
        let version = options.validate()?;
        let engine = Arc::new(factory(&options.config_path)?);

        if let Some(interval) = options.effective_tick_interval() {
            engine.set_tick_interval(interval);
        }

        let supplied = options.value_processors.len();
        let mut inserted = 0usize;
        for (name, processor) in options.value_processors {
            if engine.add_value_processor(&name, processor) {
                inserted += 1;
            } else {
                tracing::debug!(processor = %name, "Value processor already registered, keeping existing entry");
            }
        }
        if supplied > 0 {
            tracing::debug!(supplied, inserted, "Merged value processors into engine registry");
        }

        let relay = Arc::new(EventRelay::new(version));
        engine.attach(Arc::clone(&relay) as Arc<dyn NotificationSink>);

        Ok(Self {
            engine,
            relay,
            state: Arc::new(RwLock::new(ServiceState::Stopped)),
        })
    }

    /// The engine handle owned by this service.
    pub fn engine(&self) -> Arc<E> {
        Arc::clone(&self.engine)
    }

    /// The event-contract generation the service was configured with.
    pub fn contract_version(&self) -> ContractVersion {
        self.relay.version()
    }

    /// Start monitoring scheduled tasks.
    ///
    /// Suspends the caller until the run terminates: through
    /// [`stop`](SchedulerService::stop), through `cancel`, or through an
    /// unrecoverable engine fault. Cancellation is cooperative: the engine
    /// observes the token at its own polling granularity, and a cancelled
    /// run ends exactly like an explicit stop, resolving with `Ok(())`.
    ///
    /// Starting while a run is active fails with
    /// [`ServiceError::AlreadyRunning`]. Once a run has fully wound down
    /// the service is `Stopped` again and may be restarted.
    pub async fn start(&self, cancel: CancellationToken) -> Result<(), ServiceError> {
        {
            let mut state = self.state.write().await;
            if *state != ServiceState::Stopped {
                return Err(ServiceError::AlreadyRunning);
            }
            *state = ServiceState::Starting;
        }

        let run = match self.engine.start(cancel).await {
            Ok(run) => run,
            Err(e) => {
                *self.state.write().await = ServiceState::Stopped;
                tracing::warn!(error = %e, "Engine rejected start request");
                return Err(e.into());
            }
        };

        let run_id = RunId::new();
        *self.state.write().await = ServiceState::Running;
        tracing::info!(run_id = %run_id, "Scheduler run started");

        let result = run.await;
        *self.state.write().await = ServiceState::Stopped;

        match result {
            Ok(Ok(())) => {
                tracing::info!(run_id = %run_id, "Scheduler run stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(run_id = %run_id, error = %e, "Scheduler run failed");
                Err(ServiceError::Engine(e))
            }
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Scheduler run aborted");
                Err(ServiceError::Engine(EngineError::Fault(e.to_string())))
            }
        }
    }

    /// Request graceful termination of the current run.
    ///
    /// The engine stops raising due-task triggers and waits for in-flight
    /// task executions to finish; the pending [`start`](SchedulerService::start)
    /// call then resolves and the state returns to `Stopped`. Calling this
    /// when no run is active is a safe no-op.
    pub async fn stop(&self) {
        {
            let mut state = self.state.write().await;
            if *state != ServiceState::Running {
                return;
            }
            *state = ServiceState::Stopping;
        }
        self.engine.stop().await;
    }

    /// Get the current lifecycle state.
    pub async fn state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// Check if a run is active.
    pub async fn is_running(&self) -> bool {
        *self.state.read().await == ServiceState::Running
    }

    /// Subscribe to task-due notifications. Available in both contract
    /// generations.
    pub fn on_task_due(
        &self,
        handler: Arc<dyn Subscriber<TaskDue>>,
    ) -> Result<SubscriptionId, ServiceError> {
        Ok(self.relay.on_task_due(handler))
    }

    /// Subscribe to the merged error channel (v1 contract only).
    pub fn on_error(
        &self,
        handler: Arc<dyn Subscriber<ErrorEvent>>,
    ) -> Result<SubscriptionId, ServiceError> {
        self.relay
            .on_error(handler)
            .ok_or(ServiceError::ChannelUnavailable("error"))
    }

    /// Subscribe to execution-error notifications (v2 contract only).
    pub fn on_execution_error(
        &self,
        handler: Arc<dyn Subscriber<ExecutionError>>,
    ) -> Result<SubscriptionId, ServiceError> {
        self.relay
            .on_execution_error(handler)
            .ok_or(ServiceError::ChannelUnavailable("execution_error"))
    }

    /// Subscribe to loading-error notifications (v2 contract only).
    pub fn on_loading_error(
        &self,
        handler: Arc<dyn Subscriber<LoadingError>>,
    ) -> Result<SubscriptionId, ServiceError> {
        self.relay
            .on_loading_error(handler)
            .ok_or(ServiceError::ChannelUnavailable("loading_error"))
    }

    /// Remove a subscription from its channel.
    ///
    /// Returns `true` when a subscriber was removed. Removing an id twice
    /// is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.relay.unsubscribe(id)
    }
}

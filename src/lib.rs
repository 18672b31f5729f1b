//! tempo - a lifecycle and event-dispatch adapter for pluggable
//! task-scheduling engines.
//!
//! The service validates host-supplied options, owns exactly one engine
//! handle, runs the engine's monitoring loop as a single cancellable unit
//! of work, and relays the engine's notifications (task due, execution
//! error, loading error) to host subscribers across two event-contract
//! generations.

pub mod config;
pub mod core;
pub mod engine;
pub mod events;
pub mod service;
pub mod testing;

pub use crate::core::types::{RunId, TaskId};
pub use config::{ConfigError, ContractVersion, ServiceOptions, ValueProcessor};
pub use engine::{Engine, EngineError, EngineRun};
pub use events::{
    ErrorEvent, EventRelay, ExecutionError, LoadingError, NotificationSink, Subscriber,
    SubscriptionId, TaskDue,
};
pub use service::{SchedulerService, ServiceError, ServiceState};

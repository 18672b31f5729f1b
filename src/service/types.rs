//! Service type definitions.
//!
//! This module contains the lifecycle state enum and the service error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;

/// Errors that can occur in the scheduler service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid or missing service options.
    #[error("invalid service options: {0}")]
    Config(#[from] ConfigError),

    /// The engine reported an error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// `start` was called while a run is active.
    #[error("scheduler service is already running")]
    AlreadyRunning,

    /// The requested event channel is not part of the active contract
    /// generation.
    #[error("event channel '{0}' is not available under the active contract version")]
    ChannelUnavailable(&'static str),
}

/// Lifecycle state of the scheduler service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No run is active.
    Stopped,
    /// A start request was accepted; the engine has not acknowledged yet.
    Starting,
    /// The engine's monitoring run is active.
    Running,
    /// Graceful termination was requested; the run is winding down.
    Stopping,
}

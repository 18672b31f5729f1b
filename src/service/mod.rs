//! Scheduler service lifecycle.
//!
//! This module provides the service that owns one engine handle, drives
//! its monitoring run, and exposes the subscription surface.

mod adapter;
mod types;

pub use adapter::SchedulerService;
pub use types::{ServiceError, ServiceState};

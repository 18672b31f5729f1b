//! Event relaying between the engine and host subscribers.
//!
//! This module provides the notification payload types, the generic
//! dispatch channel, and the relay that selects a channel set per
//! contract generation.

mod channel;
mod relay;
mod types;

pub use channel::{Subscriber, SubscriptionId};
pub use relay::{EventRelay, NotificationSink};
pub use types::{ErrorEvent, ExecutionError, LoadingError, TaskDue};

//! Event relay between the engine and host subscribers.
//!
//! The relay owns the adapter-side subscriber lists and is registered with
//! the engine exactly once, as a single [`NotificationSink`]. Unsubscribing
//! a host handler therefore only touches the relay's own lists, never the
//! engine's observer list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::channel::Channel;
use super::types::{ErrorEvent, ExecutionError, LoadingError, TaskDue};
use super::{Subscriber, SubscriptionId};
use crate::config::ContractVersion;

/// Observer interface the engine drives with its notifications.
///
/// The engine awaits each call; for the merged generation the relay
/// detaches delivery internally, so awaiting stays cheap.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// A task's scheduled time has arrived.
    async fn task_due(&self, event: TaskDue);

    /// A due task's run failed.
    async fn execution_error(&self, event: ExecutionError);

    /// The engine failed to refresh its task list.
    async fn loading_error(&self, event: LoadingError);
}

/// Channel set for the active contract generation.
enum ChannelSet {
    /// v1: task-due plus one merged error channel, fire-and-forget.
    Merged {
        task_due: Channel<TaskDue>,
        error: Channel<ErrorEvent>,
    },
    /// v2: categorized error channels, handlers awaited in order.
    Categorized {
        task_due: Channel<TaskDue>,
        execution_error: Channel<ExecutionError>,
        loading_error: Channel<LoadingError>,
    },
}

/// Re-exposes the engine's notification categories under the adapter's own
/// event identity, across both contract generations.
pub struct EventRelay {
    version: ContractVersion,
    next_id: AtomicU64,
    channels: ChannelSet,
}

impl EventRelay {
    /// Create a relay for the given contract generation.
    pub fn new(version: ContractVersion) -> Self {
        let channels = match version {
            ContractVersion::V1 => ChannelSet::Merged {
                task_due: Channel::new(),
                error: Channel::new(),
            },
            ContractVersion::V2 => ChannelSet::Categorized {
                task_due: Channel::new(),
                execution_error: Channel::new(),
                loading_error: Channel::new(),
            },
        };
        Self {
            version,
            next_id: AtomicU64::new(1),
            channels,
        }
    }

    /// The contract generation this relay was built for.
    pub fn version(&self) -> ContractVersion {
        self.version
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to task-due notifications. Available in both generations.
    pub fn on_task_due(&self, handler: Arc<dyn Subscriber<TaskDue>>) -> SubscriptionId {
        let id = self.allocate_id();
        match &self.channels {
            ChannelSet::Merged { task_due, .. } => task_due.insert(id, handler),
            ChannelSet::Categorized { task_due, .. } => task_due.insert(id, handler),
        }
        id
    }

    /// Subscribe to the merged error channel. `None` outside v1.
    pub fn on_error(&self, handler: Arc<dyn Subscriber<ErrorEvent>>) -> Option<SubscriptionId> {
        match &self.channels {
            ChannelSet::Merged { error, .. } => {
                let id = self.allocate_id();
                error.insert(id, handler);
                Some(id)
            }
            ChannelSet::Categorized { .. } => None,
        }
    }

    /// Subscribe to execution-error notifications. `None` outside v2.
    pub fn on_execution_error(
        &self,
        handler: Arc<dyn Subscriber<ExecutionError>>,
    ) -> Option<SubscriptionId> {
        match &self.channels {
            ChannelSet::Merged { .. } => None,
            ChannelSet::Categorized {
                execution_error, ..
            } => {
                let id = self.allocate_id();
                execution_error.insert(id, handler);
                Some(id)
            }
        }
    }

    /// Subscribe to loading-error notifications. `None` outside v2.
    pub fn on_loading_error(
        &self,
        handler: Arc<dyn Subscriber<LoadingError>>,
    ) -> Option<SubscriptionId> {
        match &self.channels {
            ChannelSet::Merged { .. } => None,
            ChannelSet::Categorized { loading_error, .. } => {
                let id = self.allocate_id();
                loading_error.insert(id, handler);
                Some(id)
            }
        }
    }

    /// Remove the subscription with the given id from whichever channel
    /// holds it. Returns `true` when a subscriber was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match &self.channels {
            ChannelSet::Merged { task_due, error } => task_due.remove(id) || error.remove(id),
            ChannelSet::Categorized {
                task_due,
                execution_error,
                loading_error,
            } => task_due.remove(id) || execution_error.remove(id) || loading_error.remove(id),
        }
    }
}

#[async_trait]
impl NotificationSink for EventRelay {
    async fn task_due(&self, event: TaskDue) {
        match &self.channels {
            ChannelSet::Merged { task_due, .. } => task_due.dispatch_detached(event),
            ChannelSet::Categorized { task_due, .. } => task_due.dispatch(&event).await,
        }
    }

    async fn execution_error(&self, event: ExecutionError) {
        match &self.channels {
            ChannelSet::Merged { error, .. } => error.dispatch_detached(event.into()),
            ChannelSet::Categorized {
                execution_error, ..
            } => execution_error.dispatch(&event).await,
        }
    }

    async fn loading_error(&self, event: LoadingError) {
        match &self.channels {
            ChannelSet::Merged { error, .. } => error.dispatch_detached(event.into()),
            ChannelSet::Categorized { loading_error, .. } => loading_error.dispatch(&event).await,
        }
    }
}

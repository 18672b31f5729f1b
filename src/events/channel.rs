//! Generic dispatch channel shared by both contract generations.
//!
//! A channel owns one subscriber list. Every dispatch cycle snapshots the
//! list before invoking anything, so a handler removed between cycles is
//! never invoked again, and subscription changes cannot race an in-flight
//! dispatch.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::FutureExt;

/// Handle identifying one subscription, returned by subscribe operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Handler for notifications delivered on one channel.
#[async_trait]
pub trait Subscriber<E>: Send + Sync {
    /// Handle a notification.
    async fn notify(&self, event: &E);
}

/// One notification channel with an ordered subscriber list.
pub(crate) struct Channel<E> {
    subscribers: Mutex<Vec<(SubscriptionId, Arc<dyn Subscriber<E>>)>>,
}

impl<E: Clone + Send + Sync + 'static> Channel<E> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Append a subscriber under the given id.
    pub(crate) fn insert(&self, id: SubscriptionId, handler: Arc<dyn Subscriber<E>>) {
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .push((id, handler));
    }

    /// Remove the subscription with the given id.
    ///
    /// Returns `true` when a subscriber was removed.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .expect("subscriber list lock poisoned");
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Snapshot the current subscriber list in subscription order.
    fn snapshot(&self) -> Vec<Arc<dyn Subscriber<E>>> {
        self.subscribers
            .lock()
            .expect("subscriber list lock poisoned")
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    /// Deliver a notification, awaiting each handler in subscription order.
    ///
    /// Returns once every handler has completed. A panicking handler is
    /// logged and skipped; the remaining handlers still run.
    pub(crate) async fn dispatch(&self, event: &E) {
        for handler in self.snapshot() {
            deliver(&handler, event).await;
        }
    }

    /// Deliver a notification without waiting for the handlers.
    ///
    /// Handlers still run in subscription order, inside a detached task;
    /// the caller returns immediately.
    pub(crate) fn dispatch_detached(&self, event: E) {
        let handlers = self.snapshot();
        if handlers.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for handler in handlers {
                deliver(&handler, &event).await;
            }
        });
    }
}

async fn deliver<E>(handler: &Arc<dyn Subscriber<E>>, event: &E) {
    if AssertUnwindSafe(handler.notify(event))
        .catch_unwind()
        .await
        .is_err()
    {
        tracing::warn!("Event subscriber panicked, continuing delivery");
    }
}

/// Minimal synchronous publish/subscribe.
///
/// A [`PublishedLog`] is an append-only list of items plus the subscribers
/// interested in new ones. Publishing appends the item and then notifies
/// every subscriber exactly once, synchronously, in attachment order.
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use thiserror::Error;

/// Receives every item published after it was attached.
pub trait Subscriber<T>: Send + Sync {
    fn update(&self, item: &Arc<T>);
}

/// Something subscribers can attach to.
pub trait Publisher<T> {
    /// Register `subscriber`; the returned id is needed to detach it.
    fn attach(&mut self, subscriber: Arc<dyn Subscriber<T>>) -> SubscriberId;

    /// Remove a subscriber. Fails if `id` is not attached.
    fn detach(&mut self, id: SubscriberId) -> Result<Arc<dyn Subscriber<T>>, ObserverError>;

    /// Append `item` and notify subscribers.
    fn publish(&mut self, item: T) -> Arc<T>;
}

/// Handle returned by [`Publisher::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("subscriber {0:?} is not attached")]
    NotAttached(SubscriberId),
}

/// Append-only log of published items.
pub struct PublishedLog<T> {
    items: Vec<Arc<T>>,
    subscribers: Vec<(SubscriberId, Arc<dyn Subscriber<T>>)>,
    next_id: u64,
}

impl<T> Default for PublishedLog<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> PublishedLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items, in publish order.
    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Publisher<T> for PublishedLog<T> {
    fn attach(&mut self, subscriber: Arc<dyn Subscriber<T>>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    fn detach(&mut self, id: SubscriberId) -> Result<Arc<dyn Subscriber<T>>, ObserverError> {
        let pos = self
            .subscribers
            .iter()
            .position(|(sid, _)| *sid == id)
            .ok_or(ObserverError::NotAttached(id))?;
        Ok(self.subscribers.remove(pos).1)
    }

    fn publish(&mut self, item: T) -> Arc<T> {
        let item = Arc::new(item);
        self.items.push(item.clone());
        for (_, subscriber) in &self.subscribers {
            subscriber.update(&item);
        }
        item
    }
}

/// Forwards published items into a channel, for consumers that drain
/// updates on their own schedule (e.g. once per UI frame).
pub struct ChannelSubscriber<T> {
    tx: Sender<Arc<T>>,
}

impl<T: Send + Sync> ChannelSubscriber<T> {
    /// Create the subscriber and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<Arc<T>>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl<T: Send + Sync> Subscriber<T> for ChannelSubscriber<T> {
    fn update(&self, item: &Arc<T>) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(item.clone());
    }
}

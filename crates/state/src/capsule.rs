//! Observable state holder with last-value replay

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Holds the current value of some state and pushes every change to all
/// subscribers.
///
/// Each subscriber gets its own unbounded queue seeded with the value current
/// at subscription time, so observers never miss or reorder a publication.
/// Publishing happens under the capsule lock; concurrent publishers are
/// serialized and every subscriber sees the same order.
#[derive(Debug)]
pub struct StateCapsule<T> {
    inner: Mutex<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    current: T,
    subscribers: Vec<UnboundedSender<T>>,
}

impl<T: Clone + Send + 'static> StateCapsule<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Current value
    #[must_use]
    pub fn current(&self) -> T {
        self.lock().current.clone()
    }

    /// Replace the value and deliver it to every live subscriber.
    pub fn publish(&self, value: T) {
        let mut inner = self.lock();
        inner.publish(value);
    }

    /// Publish the value produced by `update` from the current one, if any.
    ///
    /// The closure runs under the capsule lock, so the check and the
    /// publication are atomic with respect to other publishers. Returns
    /// whether a value was published.
    pub fn publish_if<F>(&self, update: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let mut inner = self.lock();
        match update(&inner.current) {
            Some(next) => {
                inner.publish(next);
                true
            }
            None => false,
        }
    }

    /// Register an observer; the current value is delivered first.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Cannot fail: the receiver is still in hand.
        let _ = tx.send(inner.current.clone());
        inner.subscribers.push(tx);
        Subscription { rx }
    }

    /// Number of subscribers still listening
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Inner<T> {
    fn publish(&mut self, value: T) {
        self.current = value;
        let current = &self.current;
        self.subscribers
            .retain(|tx| tx.send(current.clone()).is_ok());
    }
}

impl<T: Clone + Send + Default + 'static> Default for StateCapsule<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Receiving end of a [`StateCapsule`] subscription
#[derive(Debug)]
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Next published value, `None` once the capsule is gone
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next value if one is already queued
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drain every queued value without waiting
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_replays_current() {
        let capsule = StateCapsule::new(1);
        let mut sub = capsule.subscribe();
        assert_eq!(sub.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let capsule = StateCapsule::new(0);
        let sub = capsule.subscribe();
        assert_eq!(capsule.subscriber_count(), 1);
        drop(sub);
        capsule.publish(1);
        assert_eq!(capsule.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_if_checks_current() {
        let capsule = StateCapsule::new(5);
        assert!(!capsule.publish_if(|v| (*v > 10).then_some(0)));
        assert!(capsule.publish_if(|v| Some(v + 1)));
        assert_eq!(capsule.current(), 6);
    }
}

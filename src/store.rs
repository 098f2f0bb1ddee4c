//! Observable value holder
//!
//! A [`Store`] keeps one value and tells its subscribers whenever that value
//! is replaced. Every store in this crate (counter, link, the session held by
//! an auth provider, the handles exposed by the service stores) is built on it.
//!
//! Two ways to observe a store:
//! - [`Store::subscribe`] registers a callback. It is called with the current
//!   value and then once per `set`/`update`.
//! - [`Store::changes`] returns an async stream that yields the current value
//!   first and every later value after it.
//!
//! Notifications are delivered one at a time, in write order. A write made
//! while another thread is delivering, or from inside a callback, is queued
//! and delivered after the ones before it, so a subscriber always ends on the
//! value the store holds.

use async_stream::stream;
use futures::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};
use tokio::sync::broadcast;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Boxed stream of store values
pub type ValueStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Capacity of the broadcast channel behind [`Store::changes`]
const CHANGES_CAPACITY: usize = 16;

/// Thread-safe observable value
///
/// Cloning a `Store` yields another handle to the same value.
pub struct Store<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: RwLock<Versioned<T>>,
    subscribers: Mutex<Vec<Subscriber<T>>>,
    next_id: AtomicU64,
    deliveries: Mutex<Deliveries<T>>,
    changes_tx: broadcast::Sender<(u64, T)>,
}

/// Value tagged with the number of writes that produced it
struct Versioned<T> {
    version: u64,
    value: T,
}

struct Subscriber<T> {
    id: u64,
    /// Version current at registration; only later writes reach the callback
    since: u64,
    callback: Callback<T>,
}

enum Delivery<T> {
    Change { version: u64, value: T },
    Initial { id: u64, value: T },
}

struct Deliveries<T> {
    pending: VecDeque<Delivery<T>>,
    draining: bool,
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    /// Create a store holding `initial`
    pub fn new(initial: T) -> Self {
        let (changes_tx, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(Versioned {
                    version: 0,
                    value: initial,
                }),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                deliveries: Mutex::new(Deliveries {
                    pending: VecDeque::new(),
                    draining: false,
                }),
                changes_tx,
            }),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T {
        self.read().value.clone()
    }

    /// Read the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.read().value)
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Compute the next value from the current one and notify subscribers
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.try_update(|current| Some(f(current)));
    }

    /// Like [`Store::update`], but `f` may decline by returning `None`
    ///
    /// The check and the write happen under one lock, so no other write can
    /// land between them. Returns whether the value was replaced.
    pub fn try_update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        {
            let mut state = self.write();
            let Some(next) = f(&state.value) else {
                return false;
            };
            state.version += 1;
            state.value = next.clone();

            let version = state.version;
            self.deliveries()
                .pending
                .push_back(Delivery::Change { version, value: next });
        }
        self.drain();
        true
    }

    /// Register a callback for value changes
    ///
    /// The callback receives the current value first, then every later
    /// value. Unless another delivery is in progress this happens before
    /// `subscribe` returns. Dropping the returned [`Subscription`] removes it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let state = self.read();
            self.subscribers().push(Subscriber {
                id,
                since: state.version,
                callback: Arc::new(callback),
            });
            self.deliveries().pending.push_back(Delivery::Initial {
                id,
                value: state.value.clone(),
            });
        }
        self.drain();

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|subscriber| subscriber.id != id);
        })
    }

    /// Stream of values: the current one, then every later one
    ///
    /// A consumer that falls more than a few values behind skips the values
    /// it missed.
    pub fn changes(&self) -> ValueStream<T> {
        let (mut rx, since, initial) = {
            let state = self.read();
            (
                self.shared.changes_tx.subscribe(),
                state.version,
                state.value.clone(),
            )
        };

        Box::pin(stream! {
            yield initial;

            loop {
                match rx.recv().await {
                    Ok((version, value)) if version > since => yield value,
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Versioned<T>> {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Versioned<T>> {
        self.shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber<T>>> {
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn deliveries(&self) -> MutexGuard<'_, Deliveries<T>> {
        self.shared
            .deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver queued notifications unless another caller already is
    fn drain(&self) {
        {
            let mut deliveries = self.deliveries();
            if deliveries.draining {
                return;
            }
            deliveries.draining = true;
        }

        let mut guard = DrainGuard {
            shared: &self.shared,
            finished: false,
        };

        loop {
            let delivery = {
                let mut deliveries = self.deliveries();
                match deliveries.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        // cleared under the same lock that saw the queue empty
                        deliveries.draining = false;
                        guard.finished = true;
                        return;
                    }
                }
            };
            self.deliver(delivery);
        }
    }

    fn deliver(&self, delivery: Delivery<T>) {
        match delivery {
            Delivery::Initial { id, value } => {
                let callback = self
                    .subscribers()
                    .iter()
                    .find(|subscriber| subscriber.id == id)
                    .map(|subscriber| Arc::clone(&subscriber.callback));
                if let Some(callback) = callback {
                    callback(&value);
                }
            }
            Delivery::Change { version, value } => {
                // Snapshot so callbacks may subscribe or unsubscribe while running
                let callbacks: Vec<Callback<T>> = self
                    .subscribers()
                    .iter()
                    .filter(|subscriber| subscriber.since < version)
                    .map(|subscriber| Arc::clone(&subscriber.callback))
                    .collect();

                for callback in callbacks {
                    callback(&value);
                }

                // No receivers is fine
                let _ = self.shared.changes_tx.send((version, value));
            }
        }
    }
}

/// Releases the draining flag if a callback panics mid-delivery
struct DrainGuard<'a, T> {
    shared: &'a Shared<T>,
    finished: bool,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.shared
                .deliveries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .draining = false;
        }
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self
            .shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Store").field("value", &state.value).finish()
    }
}

/// Handle to a registered callback
///
/// Dropping it unregisters the callback. Use [`Subscription::detach`] to keep
/// the callback for as long as the store lives.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unregister the callback now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the callback registered for the lifetime of the store
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

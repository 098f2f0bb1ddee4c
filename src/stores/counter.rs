//! Local counter store

use crate::store::{Store, Subscription, ValueStream};

/// Integer counter for UI state, starting at 0
#[derive(Clone, Debug, Default)]
pub struct CounterStore {
    value: Store<i64>,
}

impl CounterStore {
    /// Counter at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and notify subscribers once
    pub fn increment(&self) {
        self.value.update(|n| n + 1);
    }

    /// Current count
    pub fn get(&self) -> i64 {
        self.value.get()
    }

    /// Observe the count; see [`Store::subscribe`]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&i64) + Send + Sync + 'static,
    {
        self.value.subscribe(callback)
    }

    /// Stream of counts; see [`Store::changes`]
    pub fn changes(&self) -> ValueStream<i64> {
        self.value.changes()
    }
}

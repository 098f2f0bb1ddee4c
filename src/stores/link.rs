//! Local link store

use crate::store::{Store, Subscription, ValueStream};

/// A single mutable string (e.g. the listing currently linked to), starting empty
#[derive(Clone, Debug, Default)]
pub struct LinkStore {
    value: Store<String>,
}

impl LinkStore {
    /// Empty link
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the link
    pub fn set(&self, link: impl Into<String>) {
        self.value.set(link.into());
    }

    /// Compute the next link from the current one
    pub fn update(&self, f: impl FnOnce(&String) -> String) {
        self.value.update(f);
    }

    /// Current link
    pub fn get(&self) -> String {
        self.value.get()
    }

    /// Observe the link; see [`Store::subscribe`]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.value.subscribe(callback)
    }

    /// Stream of links; see [`Store::changes`]
    pub fn changes(&self) -> ValueStream<String> {
        self.value.changes()
    }
}

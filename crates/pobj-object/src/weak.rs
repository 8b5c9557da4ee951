//! Address-keyed table of weak references that reclaims its dead entries.
//!
//! Both the identity cache and the space's lock table are built on
//! [`WeakMap`]. Dead entries are swept on insert once the table has grown to
//! twice its size after the previous sweep, so reclaim is amortized over
//! inserts and a long-running space does not accumulate one entry per address
//! it has ever touched.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use pobj_types::Address;

/// Entry count below which inserts never sweep.
pub(crate) const MIN_SWEEP_THRESHOLD: usize = 64;

pub(crate) struct WeakMap<V: ?Sized> {
    entries: HashMap<Address, Weak<V>>,
    sweep_at: usize,
}

impl<V: ?Sized> WeakMap<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP_THRESHOLD,
        }
    }

    pub(crate) fn get(&self, address: Address) -> Option<Arc<V>> {
        self.entries.get(&address).and_then(Weak::upgrade)
    }

    /// Keep the live value at `address`, or store `value` in its place.
    pub(crate) fn insert_if_absent(&mut self, address: Address, value: Arc<V>) -> Arc<V> {
        self.get_or_insert_with(address, || value)
    }

    pub(crate) fn get_or_insert_with<F>(&mut self, address: Address, make: F) -> Arc<V>
    where
        F: FnOnce() -> Arc<V>,
    {
        if let Some(existing) = self.get(address) {
            return existing;
        }
        let value = make();
        self.entries.insert(address, Arc::downgrade(&value));
        if self.entries.len() >= self.sweep_at {
            self.sweep();
        }
        value
    }

    /// Drop dead entries and move the next sweep point. Returns how many were
    /// removed.
    pub(crate) fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_THRESHOLD);
        before - self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.sweep_at = MIN_SWEEP_THRESHOLD;
    }

    /// Number of entries, live or dead.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<V: ?Sized> Default for WeakMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized> fmt::Debug for WeakMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMap")
            .field("entries", &self.entries.len())
            .field("sweep_at", &self.sweep_at)
            .finish()
    }
}

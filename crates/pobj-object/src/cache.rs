//! Identity cache mapping persistent addresses to their live wrappers.

use std::sync::{Arc, RwLock};

use pobj_types::Address;
use tracing::debug;

use crate::error::ObjectResult;
use crate::traits::Persistent;
use crate::weak::WeakMap;

/// Identity cache from persistent address to the live wrapper for it.
///
/// Entries hold weak references: the cache never keeps an object alive on its
/// own. While any strong reference to a wrapper exists, every lookup of its
/// address returns that same wrapper, so there is never more than one live
/// wrapper per address. Entries whose wrappers have been dropped are
/// reclaimed on later inserts.
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: RwLock<WeakMap<dyn Persistent>>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live wrapper cached for `address`, if any.
    pub fn get(&self, address: Address) -> Option<Arc<dyn Persistent>> {
        self.entries.read().expect("cache lock poisoned").get(address)
    }

    /// Cache `object` under `address` unless a live wrapper is already there.
    ///
    /// Returns whichever wrapper ends up cached. A dead entry is replaced.
    pub fn insert_if_absent(
        &self,
        address: Address,
        object: Arc<dyn Persistent>,
    ) -> Arc<dyn Persistent> {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert_if_absent(address, object)
    }

    /// Return the cached wrapper for `address`, or build one with `make` and
    /// cache it.
    ///
    /// `make` runs without the cache lock held, so two threads can race to
    /// build a wrapper for the same address; the first to publish wins and
    /// the other's wrapper is discarded.
    pub fn get_or_materialize<F>(&self, address: Address, make: F) -> ObjectResult<Arc<dyn Persistent>>
    where
        F: FnOnce() -> ObjectResult<Arc<dyn Persistent>>,
    {
        if let Some(object) = self.get(address) {
            return Ok(object);
        }
        debug!(%address, "cache miss");
        let candidate = make()?;
        Ok(self.insert_if_absent(address, candidate))
    }

    /// Drop entries whose wrappers are gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let removed = entries.sweep();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "purged dead cache entries");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    /// Number of entries, live or dead.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{space, Point};
    use crate::weak::MIN_SWEEP_THRESHOLD;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fresh_point() -> Arc<dyn Persistent> {
        let space = space();
        Arc::new(Point::detached(&space))
    }

    fn same(a: &Arc<dyn Persistent>, b: &Arc<dyn Persistent>) -> bool {
        std::ptr::eq(a.object(), b.object())
    }

    #[test]
    fn first_insert_wins() {
        let cache = ObjectCache::new();
        let address = Address::new(64);
        let first = fresh_point();
        let second = fresh_point();

        let cached = cache.insert_if_absent(address, Arc::clone(&first));
        assert!(same(&cached, &first));
        let cached = cache.insert_if_absent(address, second);
        assert!(same(&cached, &first));
        assert!(same(&cache.get(address).unwrap(), &first));
    }

    #[test]
    fn entries_do_not_keep_objects_alive() {
        let cache = ObjectCache::new();
        let address = Address::new(64);
        cache.insert_if_absent(address, fresh_point());
        assert!(cache.get(address).is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn dead_entry_is_replaced() {
        let cache = ObjectCache::new();
        let address = Address::new(64);
        cache.insert_if_absent(address, fresh_point());
        let replacement = fresh_point();
        let cached = cache.insert_if_absent(address, Arc::clone(&replacement));
        assert!(same(&cached, &replacement));
    }

    #[test]
    fn materialize_only_on_miss() {
        let cache = ObjectCache::new();
        let address = Address::new(128);
        let builds = AtomicUsize::new(0);
        let make = || {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(fresh_point())
        };

        let a = cache.get_or_materialize(address, make).unwrap();
        let b = cache.get_or_materialize(address, make).unwrap();
        assert!(same(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_materialize_caches_nothing() {
        let cache = ObjectCache::new();
        let result =
            cache.get_or_materialize(Address::new(8), || Err(crate::ObjectError::SpaceClosed));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ObjectCache::new();
        let keep = fresh_point();
        cache.insert_if_absent(Address::new(8), Arc::clone(&keep));
        cache.clear();
        assert!(cache.get(Address::new(8)).is_none());
    }

    #[test]
    fn dropped_wrappers_are_reclaimed_without_explicit_purge() {
        let space = space();
        for _ in 0..200 {
            let point = space.create::<Point>().unwrap();
            assert!(space.cache().get(point.object().address()).is_some());
        }
        assert!(space.cache().len() < MIN_SWEEP_THRESHOLD);
    }

    #[test]
    fn reclaim_keeps_live_wrappers() {
        let space = space();
        let kept: Vec<Arc<Point>> = (0..100).map(|_| space.create::<Point>().unwrap()).collect();
        for _ in 0..300 {
            space.create::<Point>().unwrap();
        }
        assert!(space.cache().len() < 2 * kept.len() + MIN_SWEEP_THRESHOLD);
        for point in &kept {
            let cached = space.cache().get(point.object().address()).unwrap();
            assert!(std::ptr::eq(cached.object(), point.object()));
        }
    }
}

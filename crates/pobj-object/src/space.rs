//! The object space: lifecycle, creation, and materialization by address.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use pobj_region::{Heap, InMemoryHeap, MemoryRegion, VolatileRegion};
use pobj_txn::{run_transaction, ObjectLock, Transaction};
use pobj_types::{Address, ObjectType};
use tracing::{debug, info};

use crate::array::PersistentImmutableByteArray;
use crate::cache::ObjectCache;
use crate::config::SpaceConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::pointer::ObjectPointer;
use crate::registry::TypeRegistry;
use crate::traits::{downcast, Persistent, Reconstruct};
use crate::weak::WeakMap;

/// An open persistent object space: a heap, the identity cache over it, the
/// registry of reconstructible types, and the access configuration.
///
/// Every object holds a handle to its space. The cache is populated as
/// objects are created or materialized and emptied by [`close`](Self::close).
///
/// Locks belong to addresses, not to wrappers: every wrapper built for the
/// same address shares one [`ObjectLock`], which lives as long as any wrapper
/// or transaction holds it.
pub struct ObjectSpace {
    heap: Arc<dyn Heap>,
    cache: ObjectCache,
    locks: Mutex<WeakMap<ObjectLock>>,
    registry: Arc<TypeRegistry>,
    config: SpaceConfig,
    open: AtomicBool,
}

impl ObjectSpace {
    /// Open a space over `heap`.
    ///
    /// The immutable byte array type is registered up front; application
    /// types are added with [`register`](Self::register).
    pub fn open(heap: Arc<dyn Heap>, config: SpaceConfig) -> Arc<Self> {
        let registry = TypeRegistry::new();
        registry.register::<PersistentImmutableByteArray>();
        info!(
            allocated = heap.allocated_bytes(),
            lock_timeout = ?config.lock_timeout,
            "object space open"
        );
        Arc::new(Self {
            heap,
            cache: ObjectCache::new(),
            locks: Mutex::new(WeakMap::new()),
            registry: Arc::new(registry),
            config,
            open: AtomicBool::new(true),
        })
    }

    /// Open a space over a fresh [`InMemoryHeap`] sized by `config.heap`.
    pub fn open_in_memory(config: SpaceConfig) -> Arc<Self> {
        let heap = InMemoryHeap::with_config(config.heap.clone());
        Self::open(Arc::new(heap), config)
    }

    /// Close the space: empty the identity cache and flush the heap.
    ///
    /// Objects still held by callers keep their storage, but nothing new can
    /// be created or materialized. Closing twice is a no-op.
    pub fn close(&self) -> ObjectResult<()> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let dropped = self.cache.len();
        self.cache.clear();
        self.heap.flush()?;
        info!(cached = dropped, "object space closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_open(&self) -> ObjectResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ObjectError::SpaceClosed)
        }
    }

    pub fn heap(&self) -> &Arc<dyn Heap> {
        &self.heap
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// The lock guarding `address`.
    ///
    /// Persistent addresses map to one shared lock for as long as anything
    /// holds it. A null address (volatile storage) gets a lock of its own.
    pub(crate) fn object_lock(&self, address: Address) -> Arc<ObjectLock> {
        if address.is_null() {
            return Arc::new(ObjectLock::new());
        }
        self.locks
            .lock()
            .expect("lock table poisoned")
            .get_or_insert_with(address, || Arc::new(ObjectLock::new()))
    }

    /// Register `T` for reconstruction from an address.
    pub fn register<T: Reconstruct>(&self) {
        self.registry.register::<T>();
    }

    /// Allocate a zeroed persistent object of type `T`.
    pub fn create<T: Reconstruct>(self: &Arc<Self>) -> ObjectResult<Arc<T>> {
        self.create_with(|_| Ok(()))
    }

    /// Allocate a persistent object of type `T` and run `init` on it before
    /// it becomes visible through the cache.
    pub fn create_with<T, F>(self: &Arc<Self>, init: F) -> ObjectResult<Arc<T>>
    where
        T: Reconstruct,
        F: FnOnce(&T) -> ObjectResult<()>,
    {
        let object_type = T::object_type();
        let pointer = self.allocate(object_type, None)?;
        let object = T::reconstruct(pointer)?;
        init(&object)?;
        self.publish(Arc::new(object))
    }

    /// Create a standalone value of type `T` in volatile memory.
    ///
    /// Values have no address and are never cached; they exist to be copied
    /// into value fields.
    pub fn create_value<T: Reconstruct>(self: &Arc<Self>) -> ObjectResult<T> {
        let object_type = T::object_type();
        let region = Arc::new(VolatileRegion::new(object_type.size()));
        T::reconstruct(ObjectPointer::new(Arc::clone(self), object_type, region))
    }

    /// Allocate a block for `object_type`, or `size` bytes if given, and
    /// return a pointer to it.
    pub(crate) fn allocate(
        self: &Arc<Self>,
        object_type: Arc<ObjectType>,
        size: Option<u64>,
    ) -> ObjectResult<ObjectPointer> {
        self.ensure_open()?;
        let region = self.heap.allocate(size.unwrap_or(object_type.size()))?;
        debug!(type_name = object_type.name(), address = %region.address(), "object allocated");
        Ok(ObjectPointer::new(Arc::clone(self), object_type, Arc::new(region)))
    }

    /// Make a freshly built wrapper the cached instance for its address.
    pub(crate) fn publish<T: Persistent>(&self, object: Arc<T>) -> ObjectResult<Arc<T>> {
        let address = object.object().address();
        let name = object.object().object_type().name().to_string();
        let cached = self.cache.insert_if_absent(address, object);
        downcast(cached, &name)
    }

    /// The live wrapper for `address`, materializing it if needed, as a `T`.
    pub fn materialize<T: Reconstruct>(self: &Arc<Self>, address: Address) -> ObjectResult<Arc<T>> {
        let object_type = T::object_type();
        let object = self.resolve(address, &object_type)?;
        downcast(object, object_type.name())
    }

    /// The live wrapper for `address`.
    ///
    /// Looks in the identity cache first. On a miss the block is re-opened
    /// from the heap, rebuilt through the registry, and cached.
    pub fn resolve(
        self: &Arc<Self>,
        address: Address,
        object_type: &Arc<ObjectType>,
    ) -> ObjectResult<Arc<dyn Persistent>> {
        self.ensure_open()?;
        if address.is_null() {
            return Err(ObjectError::Reconstruction {
                type_name: object_type.name().to_string(),
                reason: "null address".into(),
            });
        }
        self.cache.get_or_materialize(address, || {
            let region = self.heap.region(address)?;
            if region.size() < object_type.size() {
                return Err(ObjectError::Reconstruction {
                    type_name: object_type.name().to_string(),
                    reason: format!(
                        "block at {address} holds {} bytes, type needs {}",
                        region.size(),
                        object_type.size()
                    ),
                });
            }
            let pointer =
                ObjectPointer::new(Arc::clone(self), Arc::clone(object_type), Arc::new(region));
            self.registry.reconstruct(pointer)
        })
    }

    /// Run `body` as a transaction, restarting it on retry conflicts, with
    /// the space's retry settings.
    pub fn transaction<T, F>(&self, body: F) -> ObjectResult<T>
    where
        F: FnMut(&Transaction) -> ObjectResult<T>,
    {
        run_transaction(&self.config.tx, body)
    }
}

impl fmt::Debug for ObjectSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpace")
            .field("open", &self.is_open())
            .field("allocated", &self.heap.allocated_bytes())
            .field("cached", &self.cache.len())
            .field("locks", &self.locks.lock().expect("lock table poisoned").len())
            .field("registry", &self.registry)
            .finish()
    }
}

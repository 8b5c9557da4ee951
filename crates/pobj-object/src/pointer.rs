//! Object pointers: the (type, storage) input to reconstruction.

use std::fmt;
use std::sync::Arc;

use pobj_region::MemoryRegion;
use pobj_types::{Address, ObjectType};

use crate::error::ObjectResult;
use crate::object::PersistentObject;
use crate::space::ObjectSpace;
use crate::traits::{downcast, Persistent, Reconstruct};

/// A (type descriptor, region) pair naming an object's storage.
///
/// Pointers carry no lock and no identity of their own; they are the input
/// to reconstruction, which wraps the storage in a [`PersistentObject`].
#[derive(Clone)]
pub struct ObjectPointer {
    space: Arc<ObjectSpace>,
    object_type: Arc<ObjectType>,
    region: Arc<dyn MemoryRegion>,
}

impl ObjectPointer {
    pub fn new(
        space: Arc<ObjectSpace>,
        object_type: Arc<ObjectType>,
        region: Arc<dyn MemoryRegion>,
    ) -> Self {
        Self {
            space,
            object_type,
            region,
        }
    }

    pub fn object_type(&self) -> &Arc<ObjectType> {
        &self.object_type
    }

    pub fn region(&self) -> &Arc<dyn MemoryRegion> {
        &self.region
    }

    pub fn space(&self) -> &Arc<ObjectSpace> {
        &self.space
    }

    /// The region's address; null for volatile storage.
    pub fn address(&self) -> Address {
        self.region.address()
    }

    /// Wrap the storage in an untyped object guarded by its address's lock.
    pub fn into_object(self) -> PersistentObject {
        PersistentObject::from_pointer(self)
    }

    /// Rebuild the wrapper through the space's registry.
    ///
    /// The result is not cached; use
    /// [`ObjectSpace::resolve`](crate::ObjectSpace::resolve) to go through
    /// the identity cache.
    pub fn reconstruct(self) -> ObjectResult<Arc<dyn Persistent>> {
        let registry = Arc::clone(self.space.registry());
        registry.reconstruct(self)
    }

    /// Rebuild the wrapper and recover its concrete type.
    pub fn reconstruct_as<T: Reconstruct>(self) -> ObjectResult<Arc<T>> {
        let expected = self.object_type.name().to_string();
        downcast(self.reconstruct()?, &expected)
    }
}

impl fmt::Debug for ObjectPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPointer")
            .field("type", &self.object_type.name())
            .field("kind", &self.region.kind())
            .field("address", &self.region.address())
            .field("size", &self.region.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{space, Point, POINT};
    use pobj_region::{RegionKind, VolatileRegion};

    #[test]
    fn volatile_pointer_has_null_address() {
        let space = space();
        let pointer = ObjectPointer::new(
            space,
            Arc::clone(&POINT.ty),
            Arc::new(VolatileRegion::new(POINT.ty.size())),
        );
        assert!(pointer.address().is_null());
        assert_eq!(pointer.region().kind(), RegionKind::Volatile);
        assert_eq!(pointer.object_type().name(), POINT.ty.name());
    }

    #[test]
    fn reconstruct_as_recovers_concrete_type() {
        let space = space();
        let region = space.heap().allocate(POINT.ty.size()).unwrap();
        let pointer = ObjectPointer::new(Arc::clone(&space), Arc::clone(&POINT.ty), Arc::new(region));
        let address = pointer.address();
        let point = pointer.reconstruct_as::<Point>().unwrap();
        assert_eq!(point.object().address(), address);
    }

    #[test]
    fn into_object_keeps_region() {
        let space = space();
        let region = space.heap().allocate(POINT.ty.size()).unwrap();
        let address = region.address();
        let object = ObjectPointer::new(space, Arc::clone(&POINT.ty), Arc::new(region)).into_object();
        assert_eq!(object.address(), address);
        assert_eq!(object.size(), POINT.ty.size());
        assert!(object.is_persistent());
    }
}

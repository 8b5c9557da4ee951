//! Traits implemented by application wrapper types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use pobj_types::ObjectType;

use crate::error::{ObjectError, ObjectResult};
use crate::object::PersistentObject;
use crate::pointer::ObjectPointer;

/// Conversion of a shared object into `Arc<dyn Any>` for downcasting.
///
/// Blanket-implemented for every sized `Send + Sync` type; trait objects
/// reach it through their vtable.
pub trait AsAny: Any + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A typed wrapper around a [`PersistentObject`].
///
/// Application types embed a `PersistentObject` and expose it here; the
/// object cache and reference fields deal in `Arc<dyn Persistent>`.
/// `Debug` is required so that shared handles can be printed and asserted on.
pub trait Persistent: AsAny + fmt::Debug {
    fn object(&self) -> &PersistentObject;
}

/// The capability of being rebuilt from existing storage.
///
/// Registering a `Reconstruct` type with a
/// [`TypeRegistry`](crate::TypeRegistry) lets the object model materialize it
/// from nothing but an address and a type descriptor.
pub trait Reconstruct: Persistent + Sized {
    /// The type descriptor; its name keys the registry.
    fn object_type() -> Arc<ObjectType>;

    /// Rebuild a wrapper over the storage named by `pointer`.
    fn reconstruct(pointer: ObjectPointer) -> ObjectResult<Self>;
}

/// Recover the concrete type of a shared persistent object.
pub(crate) fn downcast<T: Persistent>(
    object: Arc<dyn Persistent>,
    expected: &str,
) -> ObjectResult<Arc<T>> {
    let actual = object.object().object_type().name().to_string();
    AsAny::into_any(object)
        .downcast::<T>()
        .map_err(|_| ObjectError::Reconstruction {
            type_name: expected.to_string(),
            reason: format!("object is a {actual}"),
        })
}

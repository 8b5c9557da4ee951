//! Registry of reconstructible types.
//!
//! Materializing an address needs a way to turn raw storage back into the
//! right wrapper type. [`TypeRegistry`] maps each registered type name to a
//! factory that does exactly that.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{ErrorKind, ObjectError, ObjectResult};
use crate::pointer::ObjectPointer;
use crate::traits::{Persistent, Reconstruct};

/// A reconstruction factory: rebuilds a wrapper from a pointer to its storage.
pub type Factory = Arc<dyn Fn(ObjectPointer) -> ObjectResult<Arc<dyn Persistent>> + Send + Sync>;

/// Static registry mapping type names to reconstruction factories.
///
/// This is what lets the object model rebuild an object of an arbitrary
/// registered type from an address alone, without runtime reflection.
pub struct TypeRegistry {
    factories: RwLock<HashMap<String, Factory>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register `T` under its type descriptor's name.
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register<T: Reconstruct>(&self) {
        let name = T::object_type().name().to_string();
        self.register_factory(name, |pointer| {
            Ok(Arc::new(T::reconstruct(pointer)?) as Arc<dyn Persistent>)
        });
    }

    /// Register a factory for a type name directly.
    pub fn register_factory<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(ObjectPointer) -> ObjectResult<Arc<dyn Persistent>> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .expect("registry lock poisoned")
            .insert(name.into(), Arc::new(factory));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.factories.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the factory for the pointer's type and invoke it.
    ///
    /// Fails with [`ObjectError::NoFactory`] if the type is unregistered. A
    /// factory failure is reported as [`ObjectError::Reconstruction`].
    pub fn reconstruct(&self, pointer: ObjectPointer) -> ObjectResult<Arc<dyn Persistent>> {
        let name = pointer.object_type().name().to_string();
        let factory = self
            .factories
            .read()
            .expect("registry lock poisoned")
            .get(&name)
            .cloned()
            .ok_or_else(|| ObjectError::NoFactory(name.clone()))?;

        factory(pointer).map_err(|e| match e.kind() {
            ErrorKind::Reconstruction => e,
            _ => ObjectError::Reconstruction {
                type_name: name,
                reason: e.to_string(),
            },
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories = self.factories.read().expect("registry lock poisoned");
        let mut names: Vec<&String> = factories.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{space, Point, POINT};
    use pobj_region::VolatileRegion;

    fn point_pointer() -> ObjectPointer {
        let space = space();
        ObjectPointer::new(
            space,
            Arc::clone(&POINT.ty),
            Arc::new(VolatileRegion::new(POINT.ty.size())),
        )
    }

    #[test]
    fn register_and_reconstruct() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        registry.register::<Point>();
        assert!(registry.is_registered(POINT.ty.name()));
        assert_eq!(registry.len(), 1);

        let object = registry.reconstruct(point_pointer()).unwrap();
        assert_eq!(object.object().object_type().name(), POINT.ty.name());
    }

    #[test]
    fn unregistered_type_fails() {
        let registry = TypeRegistry::new();
        let err = registry.reconstruct(point_pointer()).unwrap_err();
        assert!(matches!(err, ObjectError::NoFactory(ref name) if name == POINT.ty.name()));
        assert_eq!(err.kind(), ErrorKind::Reconstruction);
    }

    #[test]
    fn failing_factory_is_a_reconstruction_error() {
        let registry = TypeRegistry::new();
        registry.register_factory(POINT.ty.name(), |_| Err(ObjectError::SpaceClosed));
        let err = registry.reconstruct(point_pointer()).unwrap_err();
        match err {
            ObjectError::Reconstruction { type_name, reason } => {
                assert_eq!(type_name, POINT.ty.name());
                assert!(reason.contains("closed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debug_lists_sorted_names() {
        let registry = TypeRegistry::new();
        registry.register_factory("b", |_| Err(ObjectError::SpaceClosed));
        registry.register_factory("a", |_| Err(ObjectError::SpaceClosed));
        assert_eq!(format!("{registry:?}"), r#"TypeRegistry { types: ["a", "b"] }"#);
    }
}

//! The untyped persistent object and its field-access protocol.

use std::fmt;
use std::sync::Arc;

use pobj_region::{MemoryRegion, VolatileRegion};
use pobj_txn::{ObjectLock, Transaction, TxError};
use pobj_types::{Address, Field, FieldDescriptor, ObjectField, ObjectType, Primitive, ValueField};
use tracing::warn;

use crate::error::{ObjectError, ObjectResult};
use crate::pointer::ObjectPointer;
use crate::space::ObjectSpace;
use crate::traits::{Persistent, Reconstruct};

/// Untyped core of every persistent object: its storage, its type
/// descriptor, and its lock.
///
/// All field access goes through one protocol. Without an active
/// transaction the lock is taken with a bounded wait, held for the single
/// access, and released. With an active transaction the lock is try-locked
/// without waiting and, on success, joins the transaction's locked set until
/// the transaction ends; on failure the access reports
/// [`ObjectError::TransactionRetry`] and the transaction body must be re-run.
pub struct PersistentObject {
    space: Arc<ObjectSpace>,
    object_type: Arc<ObjectType>,
    region: Arc<dyn MemoryRegion>,
    lock: Arc<ObjectLock>,
}

impl PersistentObject {
    /// Wrap the storage named by `pointer`.
    ///
    /// The lock comes from the space's table, so a wrapper rebuilt for an
    /// address whose lock is still held by a transaction sees it as held.
    pub fn from_pointer(pointer: ObjectPointer) -> Self {
        let space = Arc::clone(pointer.space());
        let object_type = Arc::clone(pointer.object_type());
        let region = Arc::clone(pointer.region());
        let lock = space.object_lock(region.address());
        Self {
            space,
            object_type,
            region,
            lock,
        }
    }

    pub fn address(&self) -> Address {
        self.region.address()
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

    pub fn lock(&self) -> &Arc<ObjectLock> {
        &self.lock
    }

    /// Whether the object lives in persistent storage (as opposed to being a
    /// volatile value copy).
    pub fn is_persistent(&self) -> bool {
        self.region.is_persistent()
    }

    /// Size of the object's storage in bytes.
    pub fn size(&self) -> u64 {
        self.region.size()
    }

    /// Run `f` against the region under the field-access lock protocol.
    pub(crate) fn access<R, F>(&self, tx: Option<&Transaction>, f: F) -> ObjectResult<R>
    where
        F: FnOnce(&dyn MemoryRegion) -> ObjectResult<R>,
    {
        match tx.filter(|tx| tx.is_active()) {
            Some(tx) => {
                tx.acquire(&self.lock).map_err(|e| match e {
                    TxError::Retry { .. } => ObjectError::TransactionRetry {
                        address: self.address(),
                    },
                    other => other.into(),
                })?;
                f(&*self.region)
            }
            None => {
                let timeout = self.space.config().lock_timeout;
                let Some(_guard) = self.lock.lock_for(timeout) else {
                    warn!(address = %self.address(), ?timeout, "lock wait timed out");
                    return Err(ObjectError::LockTimeout {
                        address: self.address(),
                        timeout,
                    });
                };
                f(&*self.region)
            }
        }
    }

    /// Offset of the field a handle names, rejecting handles whose kind or
    /// width disagree with this object's layout.
    fn offset(&self, handle: &FieldDescriptor) -> ObjectResult<u64> {
        Ok(self.object_type.checked_offset(handle)?)
    }

    /// Read a primitive field.
    pub fn get_field<T: Primitive>(&self, tx: Option<&Transaction>, field: Field<T>) -> ObjectResult<T> {
        let offset = self.offset(field.descriptor())?;
        let bits = self.access(tx, |region| Ok(region.get_bits(offset, T::width())?))?;
        Ok(T::from_bits(bits)?)
    }

    /// Write a primitive field.
    pub fn set_field<T: Primitive>(
        &self,
        tx: Option<&Transaction>,
        field: Field<T>,
        value: T,
    ) -> ObjectResult<()> {
        let offset = self.offset(field.descriptor())?;
        self.access(tx, |region| {
            Ok(region.put_bits(offset, T::width(), value.to_bits())?)
        })
    }

    /// Read a reference field: `None` if unset, else the live wrapper for the
    /// stored address.
    pub fn get_object_field<T: Reconstruct>(
        &self,
        tx: Option<&Transaction>,
        field: ObjectField<T>,
    ) -> ObjectResult<Option<Arc<T>>> {
        let offset = self.offset(field.descriptor())?;
        let raw = self.access(tx, |region| Ok(region.get_bits(offset, 8)?))?;
        let address = Address::new(raw);
        if address.is_null() {
            return Ok(None);
        }
        self.space.materialize::<T>(address).map(Some)
    }

    /// Point a reference field at `target`, or clear it with `None`.
    ///
    /// The target must live in persistent storage.
    pub fn set_object_field<T: Persistent>(
        &self,
        tx: Option<&Transaction>,
        field: ObjectField<T>,
        target: Option<&T>,
    ) -> ObjectResult<()> {
        let address = match target {
            None => Address::NULL,
            Some(target) => {
                let object = target.object();
                if !object.is_persistent() {
                    return Err(ObjectError::NotPersistent);
                }
                object.address()
            }
        };
        let offset = self.offset(field.descriptor())?;
        self.access(tx, |region| Ok(region.put_bits(offset, 8, address.get())?))
    }

    /// Read a value field into a new, independent volatile object.
    pub fn get_value_field<T: Reconstruct>(
        &self,
        tx: Option<&Transaction>,
        field: ValueField<T>,
    ) -> ObjectResult<T> {
        let offset = self.offset(field.descriptor())?;
        let size = field.size();
        let copy = Arc::new(VolatileRegion::new(size));
        self.access(tx, |region| Ok(region.copy_to(offset, &*copy, 0, size)?))?;
        T::reconstruct(ObjectPointer::new(
            Arc::clone(&self.space),
            T::object_type(),
            copy,
        ))
    }

    /// Copy `value`'s bytes into a value field.
    ///
    /// Fails with [`ObjectError::SizeMismatch`], writing nothing, unless the
    /// value's size equals the field's declared size.
    pub fn set_value_field<T: Persistent>(
        &self,
        tx: Option<&Transaction>,
        field: ValueField<T>,
        value: &T,
    ) -> ObjectResult<()> {
        let source = value.object();
        if source.size() != field.size() {
            return Err(ObjectError::SizeMismatch {
                expected: field.size(),
                actual: source.size(),
            });
        }
        let offset = self.offset(field.descriptor())?;
        let bytes = source.read_bytes(tx)?;
        self.access(tx, |region| Ok(region.write_bytes(offset, &bytes)?))
    }

    /// Copy the object's whole storage out, under the access protocol.
    pub fn read_bytes(&self, tx: Option<&Transaction>) -> ObjectResult<Vec<u8>> {
        self.access(tx, |region| Ok(region.to_vec()?))
    }
}

macro_rules! primitive_accessors {
    ($($get:ident, $set:ident: $ty:ty;)*) => {
        impl PersistentObject {
            $(
                pub fn $get(&self, tx: Option<&Transaction>, field: Field<$ty>) -> ObjectResult<$ty> {
                    self.get_field(tx, field)
                }

                pub fn $set(
                    &self,
                    tx: Option<&Transaction>,
                    field: Field<$ty>,
                    value: $ty,
                ) -> ObjectResult<()> {
                    self.set_field(tx, field, value)
                }
            )*
        }
    };
}

primitive_accessors! {
    get_byte_field, set_byte_field: i8;
    get_short_field, set_short_field: i16;
    get_int_field, set_int_field: i32;
    get_long_field, set_long_field: i64;
    get_float_field, set_float_field: f32;
    get_double_field, set_double_field: f64;
    get_char_field, set_char_field: char;
    get_boolean_field, set_boolean_field: bool;
}

impl Persistent for PersistentObject {
    fn object(&self) -> &PersistentObject {
        self
    }
}

impl fmt::Debug for PersistentObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentObject")
            .field("type", &self.object_type.name())
            .field("kind", &self.region.kind())
            .field("address", &self.address())
            .field("size", &self.size())
            .finish()
    }
}

//! Immutable fixed-length arrays of primitives stored behind a length header.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use pobj_txn::Transaction;
use pobj_types::{Address, ObjectType, Primitive};

use crate::error::{ObjectError, ObjectResult};
use crate::object::PersistentObject;
use crate::pointer::ObjectPointer;
use crate::space::ObjectSpace;
use crate::traits::{Persistent, Reconstruct};

const HEADER: u64 = ObjectType::ARRAY_HEADER_SIZE;

/// A fixed-length, read-only sequence of primitive elements in persistent
/// storage.
///
/// Layout: an 8-byte little-endian element count followed by the packed
/// elements. Contents are written once at creation; afterwards every read
/// goes through the object's lock protocol like any other field access.
pub struct PersistentImmutableArray<E: Primitive> {
    object: PersistentObject,
    len: usize,
    _element: PhantomData<fn() -> E>,
}

/// Immutable array of bytes.
pub type PersistentImmutableByteArray = PersistentImmutableArray<u8>;

impl<E: Primitive> PersistentImmutableArray<E> {
    /// Allocate an array holding a copy of `elements`.
    pub fn create(space: &Arc<ObjectSpace>, elements: &[E]) -> ObjectResult<Arc<Self>> {
        let width = E::width();
        let size = HEADER + elements.len() as u64 * width;

        let mut bytes = Vec::with_capacity(size as usize);
        bytes.extend_from_slice(&(elements.len() as u64).to_le_bytes());
        for element in elements {
            bytes.extend_from_slice(&element.to_bits().to_le_bytes()[..width as usize]);
        }

        // Not yet published, so no other thread can reach the block.
        let pointer = space.allocate(Self::object_type(), Some(size))?;
        pointer.region().write_bytes(0, &bytes)?;
        let array = Self::reconstruct(pointer)?;
        space.publish(Arc::new(array))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn address(&self) -> Address {
        self.object.address()
    }

    /// Read the element at `index`.
    pub fn get(&self, tx: Option<&Transaction>, index: usize) -> ObjectResult<E> {
        if index >= self.len {
            return Err(ObjectError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let width = E::width();
        let offset = HEADER + index as u64 * width;
        let bits = self
            .object
            .access(tx, |region| Ok(region.get_bits(offset, width)?))?;
        Ok(E::from_bits(bits)?)
    }

    /// Copy every element out with a single lock acquisition.
    ///
    /// Equivalent to calling [`get`](Self::get) for each index in turn.
    pub fn to_vec(&self, tx: Option<&Transaction>) -> ObjectResult<Vec<E>> {
        let width = E::width() as usize;
        let mut bytes = vec![0u8; self.len * width];
        self.object
            .access(tx, |region| Ok(region.read_bytes(HEADER, &mut bytes)?))?;
        bytes
            .chunks_exact(width)
            .map(|chunk| -> ObjectResult<E> {
                let mut raw = [0u8; 8];
                raw[..width].copy_from_slice(chunk);
                Ok(E::from_bits(u64::from_le_bytes(raw))?)
            })
            .collect()
    }
}

impl<E: Primitive> Persistent for PersistentImmutableArray<E> {
    fn object(&self) -> &PersistentObject {
        &self.object
    }
}

impl<E: Primitive> Reconstruct for PersistentImmutableArray<E> {
    fn object_type() -> Arc<ObjectType> {
        ObjectType::array(format!("pobj.ImmutableArray<{}>", type_name::<E>()), E::KIND)
    }

    fn reconstruct(pointer: ObjectPointer) -> ObjectResult<Self> {
        let fail = |reason: String| ObjectError::Reconstruction {
            type_name: pointer.object_type().name().to_string(),
            reason,
        };
        if pointer.object_type().element() != Some(E::KIND) {
            return Err(fail(format!("not an array of {}", E::KIND)));
        }
        let size = pointer.region().size();
        if size < HEADER {
            return Err(fail(format!("block of {size} bytes has no length header")));
        }
        let len = pointer.region().get_bits(0, HEADER)?;
        let expected = len.checked_mul(E::width()).and_then(|body| body.checked_add(HEADER));
        if expected != Some(size) {
            return Err(fail(format!(
                "header claims {len} elements but block holds {size} bytes"
            )));
        }
        Ok(Self {
            object: pointer.into_object(),
            len: len as usize,
            _element: PhantomData,
        })
    }
}

impl<E: Primitive> fmt::Debug for PersistentImmutableArray<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentImmutableArray")
            .field("element", &E::KIND)
            .field("address", &self.address())
            .field("len", &self.len)
            .finish()
    }
}

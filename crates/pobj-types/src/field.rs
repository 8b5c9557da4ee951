//! Field kinds, field descriptors, and the typed handles built on them.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// The kind of a declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Stored as the 32-bit Unicode scalar value.
    Char,
    /// Stored as a single byte; any nonzero byte reads as `true`.
    Boolean,
    /// Stores the persistent address of another object, or `0`.
    Reference,
    /// Embeds the bytes of a value object in place.
    Value,
}

impl FieldKind {
    /// Storage width in bytes, or `None` for value fields whose width is the
    /// embedded type's size.
    pub const fn fixed_width(self) -> Option<u64> {
        match self {
            Self::Byte | Self::Boolean => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float | Self::Char => Some(4),
            Self::Long | Self::Double | Self::Reference => Some(8),
            Self::Value => None,
        }
    }

    /// Returns `true` for the eight primitive kinds.
    pub const fn is_primitive(self) -> bool {
        !matches!(self, Self::Reference | Self::Value)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Boolean => "boolean",
            Self::Reference => "reference",
            Self::Value => "value",
        };
        f.write_str(name)
    }
}

/// Declaration of a single field: its position within the type, its kind,
/// and its declared size in bytes.
///
/// Descriptors are immutable and shared by every instance of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    index: usize,
    kind: FieldKind,
    size: u64,
}

impl FieldDescriptor {
    /// Create a descriptor for a fixed-width kind.
    ///
    /// Returns `None` for [`FieldKind::Value`], which needs an explicit size.
    pub fn fixed(index: usize, kind: FieldKind) -> Option<Self> {
        kind.fixed_width().map(|size| Self { index, kind, size })
    }

    /// Create a descriptor for an embedded value of `size` bytes.
    pub fn value(index: usize, size: u64) -> Self {
        Self {
            index,
            kind: FieldKind::Value,
            size,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Typed handle to a primitive field holding values of type `T`.
pub struct Field<T> {
    descriptor: FieldDescriptor,
    _marker: PhantomData<fn() -> T>,
}

/// Typed handle to a reference field pointing at objects of type `T`.
pub struct ObjectField<T> {
    descriptor: FieldDescriptor,
    _marker: PhantomData<fn() -> T>,
}

/// Typed handle to a value field embedding the bytes of a `T`.
pub struct ValueField<T> {
    descriptor: FieldDescriptor,
    _marker: PhantomData<fn() -> T>,
}

macro_rules! field_handle {
    ($handle:ident) => {
        impl<T> $handle<T> {
            pub(crate) fn from_descriptor(descriptor: FieldDescriptor) -> Self {
                Self {
                    descriptor,
                    _marker: PhantomData,
                }
            }

            pub fn descriptor(&self) -> &FieldDescriptor {
                &self.descriptor
            }

            pub fn index(&self) -> usize {
                self.descriptor.index
            }

            pub fn size(&self) -> u64 {
                self.descriptor.size
            }
        }

        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("index", &self.descriptor.index)
                    .field("kind", &self.descriptor.kind)
                    .field("size", &self.descriptor.size)
                    .finish()
            }
        }
    };
}

field_handle!(Field);
field_handle!(ObjectField);
field_handle!(ValueField);

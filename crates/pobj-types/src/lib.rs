//! Foundation types for the pobj persistent object model.
//!
//! This crate provides the layout vocabulary shared by every other pobj
//! crate: where an object lives, what its fields are, and how primitive
//! values are encoded into the integer bits that memory regions move.
//!
//! # Key Types
//!
//! - [`Address`] -- Persistent address of an object; `0` is the null address
//! - [`FieldKind`] -- The ten field kinds (eight primitives, reference, value)
//! - [`FieldDescriptor`] -- Index, kind, and declared size of one field
//! - [`Field`], [`ObjectField`], [`ValueField`] -- Typed handles to fields
//! - [`ObjectType`] -- Type descriptor with a resolved offset table
//! - [`Primitive`] -- Bit encoding for primitive field values

pub mod address;
pub mod error;
pub mod field;
pub mod layout;
pub mod primitive;

pub use address::Address;
pub use error::{TypeError, TypeResult};
pub use field::{Field, FieldDescriptor, FieldKind, ObjectField, ValueField};
pub use layout::{ObjectType, TypeBuilder};
pub use primitive::Primitive;

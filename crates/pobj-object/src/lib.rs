//! Persistent objects: typed, field-addressable views over persistent memory.
//!
//! Application types wrap a [`PersistentObject`] and declare their layout as
//! an [`ObjectType`](pobj_types::ObjectType). Fields are read and written
//! through typed handles, with or without a transaction:
//!
//! - **Primitive fields** move through the object's lock protocol (see
//!   [`pobj_txn`]) as little-endian integers.
//! - **Reference fields** store an address. Reading one returns the single
//!   live wrapper for that address from the [`ObjectCache`].
//! - **Value fields** embed another type's bytes in place. Reading one returns
//!   an independent volatile copy.
//!
//! An [`ObjectSpace`] owns the heap, the identity cache, the [`TypeRegistry`]
//! of reconstructible types, and the [`SpaceConfig`].
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//!
//! use pobj_object::{
//!     ObjectPointer, ObjectResult, ObjectSpace, Persistent, PersistentObject, Reconstruct,
//!     SpaceConfig,
//! };
//! use pobj_types::{Field, ObjectType};
//!
//! struct AccountLayout {
//!     ty: Arc<ObjectType>,
//!     balance: Field<i64>,
//! }
//!
//! static ACCOUNT: LazyLock<AccountLayout> = LazyLock::new(|| {
//!     let mut b = ObjectType::builder("bank.Account");
//!     let balance = b.field();
//!     AccountLayout { ty: b.build(), balance }
//! });
//!
//! #[derive(Debug)]
//! struct Account(PersistentObject);
//!
//! impl Persistent for Account {
//!     fn object(&self) -> &PersistentObject {
//!         &self.0
//!     }
//! }
//!
//! impl Reconstruct for Account {
//!     fn object_type() -> Arc<ObjectType> {
//!         Arc::clone(&ACCOUNT.ty)
//!     }
//!
//!     fn reconstruct(pointer: ObjectPointer) -> ObjectResult<Self> {
//!         Ok(Self(pointer.into_object()))
//!     }
//! }
//!
//! let space = ObjectSpace::open_in_memory(SpaceConfig::default());
//! space.register::<Account>();
//! let from = space.create::<Account>()?;
//! let to = space.create::<Account>()?;
//! from.object().set_long_field(None, ACCOUNT.balance, 100)?;
//!
//! space.transaction(|tx| {
//!     let a = from.object().get_long_field(Some(tx), ACCOUNT.balance)?;
//!     from.object().set_long_field(Some(tx), ACCOUNT.balance, a - 30)?;
//!     let b = to.object().get_long_field(Some(tx), ACCOUNT.balance)?;
//!     to.object().set_long_field(Some(tx), ACCOUNT.balance, b + 30)
//! })?;
//!
//! assert_eq!(from.object().get_long_field(None, ACCOUNT.balance)?, 70);
//! assert_eq!(to.object().get_long_field(None, ACCOUNT.balance)?, 30);
//! # Ok::<(), pobj_object::ObjectError>(())
//! ```
//!
//! # Design Rules
//!
//! 1. At most one live wrapper exists per persistent address, and every
//!    wrapper for an address shares that address's lock.
//! 2. A value-field read never shares memory with its source.
//! 3. A reference field holds `0` or the address of a persistent object.
//! 4. A value-field write with a mismatched size writes nothing.
//! 5. Transactional access never blocks; conflicts surface as
//!    [`ObjectError::TransactionRetry`] and are absorbed by
//!    [`ObjectSpace::transaction`].

pub mod array;
pub mod cache;
pub mod config;
pub mod error;
pub mod object;
pub mod pointer;
pub mod registry;
pub mod space;
pub mod traits;
mod weak;

#[cfg(test)]
mod testing;

pub use array::{PersistentImmutableArray, PersistentImmutableByteArray};
pub use cache::ObjectCache;
pub use config::SpaceConfig;
pub use error::{ErrorKind, ObjectError, ObjectResult};
pub use object::PersistentObject;
pub use pointer::ObjectPointer;
pub use registry::{Factory, TypeRegistry};
pub use space::ObjectSpace;
pub use traits::{AsAny, Persistent, Reconstruct};

// Re-exported so that callers can drive transactions without naming the
// lower crates.
pub use pobj_txn::{Retryable, Transaction, TxConfig, TxError};

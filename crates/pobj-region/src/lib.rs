//! Memory regions for the pobj persistent object model.
//!
//! A region is a contiguous block of bytes with typed byte-offset accessors.
//! Two kinds share one interface, so field-access code never cares which it
//! is talking to:
//!
//! - [`PersistentRegion`] -- a block of the durable heap, identified by its
//!   [`Address`](pobj_types::Address)
//! - [`VolatileRegion`] -- ordinary transient memory, used for value copies
//!
//! # Heap
//!
//! Blocks are handed out by a [`Heap`]. The allocator proper (durability,
//! flushing, recovery) lives outside this workspace; [`InMemoryHeap`] is a
//! bump allocator over a fixed arena for tests and embedding.
//!
//! # Design Rules
//!
//! 1. A region's address and size never change after creation.
//! 2. Every access is bounds-checked: `offset + width <= size`.
//! 3. Regions perform no locking. Callers serialize access externally.
//! 4. Multi-byte values are little-endian.

pub mod error;
pub mod memory;
pub mod persistent;
pub mod region;
pub mod traits;
pub mod volatile;

pub use error::{RegionError, RegionResult};
pub use memory::{HeapConfig, InMemoryHeap};
pub use persistent::PersistentRegion;
pub use region::{check_bounds, MemoryRegion, RegionKind};
pub use traits::Heap;
pub use volatile::VolatileRegion;

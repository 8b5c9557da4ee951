//! In-memory heap for tests and ephemeral spaces.
//!
//! [`InMemoryHeap`] is a bump allocator over one zeroed arena. Blocks are
//! never freed, so an address stays valid for the life of the heap and can
//! be re-opened with [`Heap::region`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pobj_types::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RegionError, RegionResult};
use crate::persistent::PersistentRegion;
use crate::region::Cells;
use crate::traits::Heap;

/// Configuration for an [`InMemoryHeap`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Arena size in bytes (default: 16 MiB).
    pub capacity: u64,
    /// Block alignment in bytes (default: 8).
    pub alignment: u64,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            capacity: 16 * 1024 * 1024,
            alignment: 8,
        }
    }
}

/// Allocation bookkeeping, guarded by the heap mutex.
struct HeapState {
    /// Offset of the next free byte.
    next: u64,
    /// Size of every allocated block, keyed by start address.
    blocks: HashMap<Address, u64>,
}

/// Bump allocator over a fixed in-memory arena.
///
/// Intended for tests and embedding. Blocks are never freed; the arena is
/// dropped with the heap. The first `alignment` bytes are reserved so that no
/// block starts at the null address.
pub struct InMemoryHeap {
    arena: Arc<Cells>,
    config: HeapConfig,
    state: Mutex<HeapState>,
}

impl InMemoryHeap {
    /// Create a heap with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Create a heap with an arena of `capacity` bytes.
    pub fn with_capacity(capacity: u64) -> Self {
        Self::with_config(HeapConfig {
            capacity,
            ..HeapConfig::default()
        })
    }

    pub fn with_config(config: HeapConfig) -> Self {
        let alignment = config.alignment.max(1);
        Self {
            arena: Arc::new(Cells::zeroed(config.capacity as usize)),
            state: Mutex::new(HeapState {
                next: alignment,
                blocks: HashMap::new(),
            }),
            config,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    /// Number of blocks allocated so far.
    pub fn block_count(&self) -> usize {
        self.state.lock().expect("heap lock poisoned").blocks.len()
    }

    fn alignment(&self) -> u64 {
        self.config.alignment.max(1)
    }
}

impl Default for InMemoryHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap for InMemoryHeap {
    fn allocate(&self, size: u64) -> RegionResult<PersistentRegion> {
        let alignment = self.alignment();
        let mut state = self.state.lock().expect("heap lock poisoned");
        let available = self.config.capacity.saturating_sub(state.next);

        // Zero-sized blocks still get a distinct address.
        let footprint = size
            .max(1)
            .checked_next_multiple_of(alignment)
            .filter(|footprint| *footprint <= available);
        let Some(footprint) = footprint else {
            warn!(requested = size, available, "heap exhausted");
            return Err(RegionError::OutOfMemory {
                requested: size,
                available,
            });
        };

        let address = Address::new(state.next);
        state.next += footprint;
        state.blocks.insert(address, size);
        debug!(%address, size, "heap allocate");
        Ok(PersistentRegion::new(Arc::clone(&self.arena), address, size))
    }

    fn region(&self, address: Address) -> RegionResult<PersistentRegion> {
        let state = self.state.lock().expect("heap lock poisoned");
        let size = state
            .blocks
            .get(&address)
            .copied()
            .ok_or(RegionError::UnknownAddress(address))?;
        Ok(PersistentRegion::new(Arc::clone(&self.arena), address, size))
    }

    fn allocated_bytes(&self) -> u64 {
        let state = self.state.lock().expect("heap lock poisoned");
        state.next - self.alignment()
    }
}

impl std::fmt::Debug for InMemoryHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHeap")
            .field("capacity", &self.config.capacity)
            .field("block_count", &self.block_count())
            .finish()
    }
}

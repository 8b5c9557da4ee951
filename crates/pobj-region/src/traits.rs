//! The heap trait: allocation and re-opening of persistent blocks.

use pobj_types::Address;

use crate::error::RegionResult;
use crate::persistent::PersistentRegion;

/// Allocator for persistent storage blocks.
///
/// All implementations must satisfy these invariants:
/// - Addresses are never `0`; the null address means "no object".
/// - A block's address and size never change once allocated.
/// - Re-opening a block by address yields a view of the same bytes.
/// - Allocation and lookup are safe to call concurrently.
pub trait Heap: Send + Sync {
    /// Allocate a zeroed block of `size` bytes.
    fn allocate(&self, size: u64) -> RegionResult<PersistentRegion>;

    /// Re-open the block that starts at `address`.
    ///
    /// Returns `Err(UnknownAddress)` if no block was allocated there.
    fn region(&self, address: Address) -> RegionResult<PersistentRegion>;

    /// Make all prior writes durable.
    ///
    /// The default does nothing, which is correct for heaps with no backing
    /// store.
    fn flush(&self) -> RegionResult<()> {
        Ok(())
    }

    /// Total bytes handed out so far, including alignment padding.
    fn allocated_bytes(&self) -> u64;
}

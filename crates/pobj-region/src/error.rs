//! Region and heap errors.

use pobj_types::Address;

/// Errors from region access and heap allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// An access fell outside the region. Always a layout or caller bug.
    #[error("access of {width} bytes at offset {offset} exceeds region size {size}")]
    Bounds { offset: u64, width: u64, size: u64 },

    /// A typed access asked for a width other than 1, 2, 4, or 8 bytes.
    #[error("unsupported access width: {0}")]
    InvalidWidth(u64),

    /// The heap cannot satisfy an allocation.
    #[error("out of heap memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: u64, available: u64 },

    /// No allocated block starts at the given address.
    #[error("no allocated block at address {0}")]
    UnknownAddress(Address),
}

/// Result alias for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

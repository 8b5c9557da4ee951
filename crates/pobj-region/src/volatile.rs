//! Regions backed by their own cells, outside any heap.

use pobj_types::Address;

use crate::error::RegionResult;
use crate::region::{check_bounds, Cells, MemoryRegion, RegionKind};

/// Transient, zero-initialized memory with the same interface as a heap block.
///
/// Value-field reads copy embedded bytes into a fresh `VolatileRegion`, so the
/// resulting object shares no memory with its source.
#[derive(Debug)]
pub struct VolatileRegion {
    cells: Cells,
}

impl VolatileRegion {
    /// Allocate `size` zeroed bytes.
    pub fn new(size: u64) -> Self {
        Self {
            cells: Cells::zeroed(size as usize),
        }
    }

    /// Allocate a region holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let cells = Cells::zeroed(bytes.len());
        cells.store(0, bytes);
        Self { cells }
    }
}

impl MemoryRegion for VolatileRegion {
    fn kind(&self) -> RegionKind {
        RegionKind::Volatile
    }

    fn address(&self) -> Address {
        Address::NULL
    }

    fn size(&self) -> u64 {
        self.cells.len() as u64
    }

    fn read_bytes(&self, offset: u64, dst: &mut [u8]) -> RegionResult<()> {
        check_bounds(offset, dst.len() as u64, self.size())?;
        self.cells.load(offset as usize, dst);
        Ok(())
    }

    fn write_bytes(&self, offset: u64, src: &[u8]) -> RegionResult<()> {
        check_bounds(offset, src.len() as u64, self.size())?;
        self.cells.store(offset as usize, src);
        Ok(())
    }
}

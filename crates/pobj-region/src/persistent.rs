//! Regions that are windows into a heap arena.

use std::fmt;
use std::sync::Arc;

use pobj_types::Address;

use crate::error::RegionResult;
use crate::region::{check_bounds, Cells, MemoryRegion, RegionKind};

/// A block of the persistent heap.
///
/// Cloning a `PersistentRegion` yields another view of the same bytes; the
/// block is identified by its [`Address`], which is also its offset inside the
/// heap arena.
#[derive(Clone)]
pub struct PersistentRegion {
    arena: Arc<Cells>,
    address: Address,
    size: u64,
}

impl PersistentRegion {
    /// The heap guarantees `address + size` lies inside `arena`.
    pub(crate) fn new(arena: Arc<Cells>, address: Address, size: u64) -> Self {
        Self {
            arena,
            address,
            size,
        }
    }

    fn start(&self, offset: u64) -> usize {
        (self.address.get() + offset) as usize
    }
}

impl MemoryRegion for PersistentRegion {
    fn kind(&self) -> RegionKind {
        RegionKind::Persistent
    }

    fn address(&self) -> Address {
        self.address
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&self, offset: u64, dst: &mut [u8]) -> RegionResult<()> {
        check_bounds(offset, dst.len() as u64, self.size)?;
        self.arena.load(self.start(offset), dst);
        Ok(())
    }

    fn write_bytes(&self, offset: u64, src: &[u8]) -> RegionResult<()> {
        check_bounds(offset, src.len() as u64, self.size)?;
        self.arena.store(self.start(offset), src);
        Ok(())
    }
}

impl fmt::Debug for PersistentRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentRegion")
            .field("address", &self.address)
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegionError;

    fn region_in(arena: &Arc<Cells>, address: u64, size: u64) -> PersistentRegion {
        PersistentRegion::new(Arc::clone(arena), Address::new(address), size)
    }

    #[test]
    fn accesses_are_relative_to_block_start() {
        let arena = Arc::new(Cells::zeroed(64));
        let region = region_in(&arena, 16, 8);
        region.put_short(2, 0x1234).unwrap();

        let mut raw = [0u8; 2];
        arena.load(18, &mut raw);
        assert_eq!(raw, [0x34, 0x12]);
        assert_eq!(region.address(), Address::new(16));
        assert!(region.is_persistent());
    }

    #[test]
    fn clones_share_bytes() {
        let arena = Arc::new(Cells::zeroed(32));
        let a = region_in(&arena, 8, 8);
        let b = a.clone();
        a.put_long(0, 77).unwrap();
        assert_eq!(b.get_long(0).unwrap(), 77);
    }

    #[test]
    fn adjacent_blocks_do_not_overlap() {
        let arena = Arc::new(Cells::zeroed(32));
        let a = region_in(&arena, 8, 8);
        let b = region_in(&arena, 16, 8);
        a.put_long(0, -1).unwrap();
        assert_eq!(b.get_long(0).unwrap(), 0);
        assert_eq!(
            a.get_byte(8),
            Err(RegionError::Bounds {
                offset: 8,
                width: 1,
                size: 8
            })
        );
    }

    #[test]
    fn debug_shows_address_and_size() {
        let arena = Arc::new(Cells::zeroed(32));
        let debug = format!("{:?}", region_in(&arena, 8, 4));
        assert!(debug.contains("PersistentRegion"));
        assert!(debug.contains("0x8"));
    }
}

//! The memory region abstraction.
//!
//! A region is a bounded run of bytes with a kind and a base address. All
//! typed access is little-endian and checked against the region's size
//! before any byte moves.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use pobj_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{RegionError, RegionResult};

/// Which kind of memory backs a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// A block of the durable heap.
    Persistent,
    /// Ordinary transient memory.
    Volatile,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => write!(f, "persistent"),
            Self::Volatile => write!(f, "volatile"),
        }
    }
}

/// Check that `width` bytes at `offset` fit inside a region of `size` bytes.
pub fn check_bounds(offset: u64, width: u64, size: u64) -> RegionResult<()> {
    match offset.checked_add(width) {
        Some(end) if end <= size => Ok(()),
        _ => Err(RegionError::Bounds {
            offset,
            width,
            size,
        }),
    }
}

fn access_width(width: u64) -> RegionResult<usize> {
    match width {
        1 | 2 | 4 | 8 => Ok(width as usize),
        other => Err(RegionError::InvalidWidth(other)),
    }
}

/// A contiguous block of bytes with typed byte-offset accessors.
///
/// Implementations only provide raw byte movement; the typed accessors are
/// derived from it. Regions perform no locking: concurrent access to the same
/// bytes must be serialized by the caller (in pobj, by the owning object's
/// lock).
pub trait MemoryRegion: Send + Sync + fmt::Debug {
    /// The kind of memory backing this region.
    fn kind(&self) -> RegionKind;

    /// Persistent address of the block. Volatile regions report
    /// [`Address::NULL`].
    fn address(&self) -> Address;

    /// Size of the region in bytes.
    fn size(&self) -> u64;

    /// Copy `dst.len()` bytes starting at `offset` into `dst`.
    fn read_bytes(&self, offset: u64, dst: &mut [u8]) -> RegionResult<()>;

    /// Copy `src` into the region starting at `offset`.
    fn write_bytes(&self, offset: u64, src: &[u8]) -> RegionResult<()>;

    fn is_persistent(&self) -> bool {
        self.kind() == RegionKind::Persistent
    }

    /// Read `width` bytes at `offset` as a zero-extended little-endian integer.
    fn get_bits(&self, offset: u64, width: u64) -> RegionResult<u64> {
        let width = access_width(width)?;
        let mut buf = [0u8; 8];
        self.read_bytes(offset, &mut buf[..width])?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Write the low `width` bytes of `bits` at `offset`.
    fn put_bits(&self, offset: u64, width: u64, bits: u64) -> RegionResult<()> {
        let width = access_width(width)?;
        self.write_bytes(offset, &bits.to_le_bytes()[..width])
    }

    fn get_byte(&self, offset: u64) -> RegionResult<i8> {
        Ok(self.get_bits(offset, 1)? as u8 as i8)
    }

    fn get_short(&self, offset: u64) -> RegionResult<i16> {
        Ok(self.get_bits(offset, 2)? as u16 as i16)
    }

    fn get_int(&self, offset: u64) -> RegionResult<i32> {
        Ok(self.get_bits(offset, 4)? as u32 as i32)
    }

    fn get_long(&self, offset: u64) -> RegionResult<i64> {
        Ok(self.get_bits(offset, 8)? as i64)
    }

    fn put_byte(&self, offset: u64, value: i8) -> RegionResult<()> {
        self.put_bits(offset, 1, u64::from(value as u8))
    }

    fn put_short(&self, offset: u64, value: i16) -> RegionResult<()> {
        self.put_bits(offset, 2, u64::from(value as u16))
    }

    fn put_int(&self, offset: u64, value: i32) -> RegionResult<()> {
        self.put_bits(offset, 4, u64::from(value as u32))
    }

    fn put_long(&self, offset: u64, value: i64) -> RegionResult<()> {
        self.put_bits(offset, 8, value as u64)
    }

    /// Copy `len` bytes at `offset` into `dst` at `dst_offset`.
    ///
    /// Both ranges are checked before any byte moves, so a failed copy
    /// leaves `dst` untouched.
    fn copy_to(
        &self,
        offset: u64,
        dst: &dyn MemoryRegion,
        dst_offset: u64,
        len: u64,
    ) -> RegionResult<()> {
        check_bounds(offset, len, self.size())?;
        check_bounds(dst_offset, len, dst.size())?;
        let mut buf = vec![0u8; len as usize];
        self.read_bytes(offset, &mut buf)?;
        dst.write_bytes(dst_offset, &buf)
    }

    /// Copy the whole region out.
    fn to_vec(&self) -> RegionResult<Vec<u8>> {
        let mut buf = vec![0u8; self.size() as usize];
        self.read_bytes(0, &mut buf)?;
        Ok(buf)
    }
}

/// Byte cells shared by region implementations.
///
/// Cells are individually atomic so that regions can be shared across threads
/// without `unsafe`. Relaxed ordering is enough: the object lock that
/// serializes an access also orders it.
pub(crate) struct Cells(Box<[AtomicU8]>);

impl Cells {
    pub(crate) fn zeroed(len: usize) -> Self {
        Self((0..len).map(|_| AtomicU8::new(0)).collect())
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Caller guarantees `start + dst.len() <= len()`.
    pub(crate) fn load(&self, start: usize, dst: &mut [u8]) {
        let len = dst.len();
        for (byte, cell) in dst.iter_mut().zip(&self.0[start..start + len]) {
            *byte = cell.load(Ordering::Relaxed);
        }
    }

    /// Caller guarantees `start + src.len() <= len()`.
    pub(crate) fn store(&self, start: usize, src: &[u8]) {
        for (cell, byte) in self.0[start..start + src.len()].iter().zip(src) {
            cell.store(*byte, Ordering::Relaxed);
        }
    }
}

impl fmt::Debug for Cells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cells").field("len", &self.len()).finish()
    }
}

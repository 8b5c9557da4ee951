//! Persistent addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persistent address of an object's storage block.
///
/// Addresses are handed out by the heap and never change for the lifetime of
/// the block. The zero address is reserved: a reference field holding `0`
/// is unset.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Address(u64);

impl Address {
    /// The null address. Represents "no object".
    pub const NULL: Self = Self(0);

    /// Wrap a raw address value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw address value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is the null address.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

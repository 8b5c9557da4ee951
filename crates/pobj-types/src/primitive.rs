//! Bit encodings of the primitive field types.
//!
//! Every primitive travels through a region as the low bytes of a `u64`.
//! Floats keep their raw IEEE bits, `char` is stored as its scalar value and
//! `bool` as 0 or 1.

use crate::error::{TypeError, TypeResult};
use crate::field::FieldKind;

/// A value that can live in a primitive field.
///
/// Memory regions only move integers, so every primitive encodes to the low
/// `width` bytes of a `u64` and decodes from them. Floats travel as their
/// IEEE-754 raw bits, which keeps signed zero and NaN payloads intact.
pub trait Primitive: Copy + Send + Sync + 'static {
    /// The field kind that stores this type.
    const KIND: FieldKind;

    /// Encode into raw bits. Only the low `width()` bytes are significant.
    fn to_bits(self) -> u64;

    /// Decode from raw bits read from a field of this kind.
    fn from_bits(bits: u64) -> TypeResult<Self>;

    /// Storage width in bytes.
    fn width() -> u64 {
        Self::KIND.fixed_width().unwrap_or(8)
    }
}

macro_rules! integer_primitive {
    ($ty:ty, $unsigned:ty, $kind:ident) => {
        impl Primitive for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn to_bits(self) -> u64 {
                self as $unsigned as u64
            }

            fn from_bits(bits: u64) -> TypeResult<Self> {
                Ok(bits as $unsigned as $ty)
            }
        }
    };
}

integer_primitive!(i8, u8, Byte);
integer_primitive!(u8, u8, Byte);
integer_primitive!(i16, u16, Short);
integer_primitive!(u16, u16, Short);
integer_primitive!(i32, u32, Int);
integer_primitive!(u32, u32, Int);
integer_primitive!(i64, u64, Long);
integer_primitive!(u64, u64, Long);

impl Primitive for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }

    fn from_bits(bits: u64) -> TypeResult<Self> {
        Ok(f32::from_bits(bits as u32))
    }
}

impl Primitive for f64 {
    const KIND: FieldKind = FieldKind::Double;

    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> TypeResult<Self> {
        Ok(f64::from_bits(bits))
    }
}

impl Primitive for char {
    const KIND: FieldKind = FieldKind::Char;

    fn to_bits(self) -> u64 {
        u64::from(u32::from(self))
    }

    fn from_bits(bits: u64) -> TypeResult<Self> {
        let scalar = bits as u32;
        char::from_u32(scalar).ok_or(TypeError::InvalidChar(scalar))
    }
}

impl Primitive for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    fn from_bits(bits: u64) -> TypeResult<Self> {
        Ok(bits as u8 != 0)
    }
}

//! Errors raised while resolving layouts and decoding primitive bits.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors produced by layout and encoding operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("type {type_name} has no field at index {index}")]
    UnknownField { type_name: String, index: usize },

    /// A handle declared for one layout was used on a type whose field at
    /// that index has a different kind or width.
    #[error("field {index} of {type_name} is {declared_kind} ({declared_size} bytes), handle expects {handle_kind} ({handle_size} bytes)")]
    FieldMismatch {
        type_name: String,
        index: usize,
        declared_kind: FieldKind,
        declared_size: u64,
        handle_kind: FieldKind,
        handle_size: u64,
    },

    #[error("stored bits {0:#x} are not a valid char")]
    InvalidChar(u32),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;

//! Object-model errors and their coarse classification.

use std::time::Duration;

use pobj_region::RegionError;
use pobj_txn::{Retryable, TxError};
use pobj_types::{Address, TypeError};

/// Errors from persistent object operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// Region access or allocation failed.
    #[error("region error: {0}")]
    Region(#[from] RegionError),

    /// Array element index past the end.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A non-transactional access waited too long for an object's lock.
    #[error("timed out after {timeout:?} waiting for the lock on object {address}")]
    LockTimeout { address: Address, timeout: Duration },

    /// A transactional try-lock lost to another holder. The enclosing
    /// transaction body must be re-run.
    #[error("object {address} is locked elsewhere; transaction must retry")]
    TransactionRetry { address: Address },

    /// No reconstruction factory is registered for the type.
    #[error("no reconstruction factory registered for type {0}")]
    NoFactory(String),

    /// A factory failed, or produced an object of an unexpected type.
    #[error("cannot reconstruct {type_name}: {reason}")]
    Reconstruction { type_name: String, reason: String },

    /// A value object's size differs from the value field's declared size.
    #[error("value size mismatch: field holds {expected} bytes, value has {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// A reference field can only point at objects in persistent storage.
    #[error("reference target is not in persistent storage")]
    NotPersistent,

    /// A stored field value could not be decoded, or a field index is unknown.
    #[error("field error: {0}")]
    Field(#[from] TypeError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("object space is closed")]
    SpaceClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of [`ObjectError`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Offset, width, or index outside the storage. Caller or layout bug.
    Bounds,
    /// Blocking lock acquire exceeded its timeout.
    LockTimeout,
    /// Transactional try-lock failed; recoverable by re-running the body.
    TransactionRetry,
    /// Missing or failing reconstruction factory. Configuration error.
    Reconstruction,
    /// Value-field set with differing sizes. Nothing was written.
    SizeMismatch,
    Other,
}

impl ObjectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Region(RegionError::Bounds { .. } | RegionError::InvalidWidth(_))
            | Self::IndexOutOfBounds { .. } => ErrorKind::Bounds,
            Self::LockTimeout { .. } => ErrorKind::LockTimeout,
            Self::TransactionRetry { .. } | Self::Transaction(TxError::Retry { .. }) => {
                ErrorKind::TransactionRetry
            }
            Self::NoFactory(_) | Self::Reconstruction { .. } | Self::NotPersistent => {
                ErrorKind::Reconstruction
            }
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            _ => ErrorKind::Other,
        }
    }
}

impl Retryable for ObjectError {
    fn is_retry(&self) -> bool {
        self.kind() == ErrorKind::TransactionRetry
    }
}

/// Result alias for object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let bounds = ObjectError::Region(RegionError::Bounds {
            offset: 4,
            width: 8,
            size: 8,
        });
        assert_eq!(bounds.kind(), ErrorKind::Bounds);
        assert_eq!(
            ObjectError::IndexOutOfBounds { index: 3, len: 3 }.kind(),
            ErrorKind::Bounds
        );
        assert_eq!(
            ObjectError::Region(RegionError::UnknownAddress(Address::new(8))).kind(),
            ErrorKind::Other
        );
        assert_eq!(ObjectError::NoFactory("T".into()).kind(), ErrorKind::Reconstruction);
        assert_eq!(
            ObjectError::SizeMismatch {
                expected: 8,
                actual: 12
            }
            .kind(),
            ErrorKind::SizeMismatch
        );
    }

    #[test]
    fn only_retry_kinds_are_retryable() {
        assert!(ObjectError::TransactionRetry {
            address: Address::new(8)
        }
        .is_retry());
        assert!(ObjectError::from(TxError::Retry { id: 1 }).is_retry());
        assert!(!ObjectError::LockTimeout {
            address: Address::new(8),
            timeout: Duration::from_secs(5)
        }
        .is_retry());
        assert!(!ObjectError::from(TxError::RetryLimitExceeded { attempts: 2 }).is_retry());
    }

    #[test]
    fn messages_include_context() {
        let msg = ObjectError::SizeMismatch {
            expected: 8,
            actual: 12,
        }
        .to_string();
        assert!(msg.contains('8') && msg.contains("12"));
    }
}

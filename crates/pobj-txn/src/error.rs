//! Lock and transaction errors.

/// Errors produced by transaction bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// A try-lock inside the transaction found the lock held elsewhere.
    /// The body must be re-run from the start.
    #[error("transaction {id} lost a lock race; retry required")]
    Retry { id: u64 },

    /// The transaction already committed or aborted.
    #[error("transaction {id} is not active")]
    NotActive { id: u64 },

    /// The retry loop gave up.
    #[error("transaction abandoned after {attempts} attempts")]
    RetryLimitExceeded { attempts: u32 },
}

/// Result alias used throughout the txn crate.
pub type TxResult<T> = Result<T, TxError>;

/// Classifies errors the retry loop may recover from by re-running the body.
pub trait Retryable {
    /// Returns `true` if the failed attempt should be discarded and retried.
    fn is_retry(&self) -> bool;
}

impl Retryable for TxError {
    fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_retry_is_retryable() {
        assert!(TxError::Retry { id: 1 }.is_retry());
        assert!(!TxError::NotActive { id: 1 }.is_retry());
        assert!(!TxError::RetryLimitExceeded { attempts: 3 }.is_retry());
    }

    #[test]
    fn messages_name_the_transaction() {
        let msg = TxError::NotActive { id: 42 }.to_string();
        assert!(msg.contains("42"));
    }
}

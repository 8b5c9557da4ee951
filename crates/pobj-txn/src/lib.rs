//! Locking and transaction primitives for the pobj persistent object model.
//!
//! Every persistent object carries an [`ObjectLock`]. Field access acquires
//! it in one of two ways, depending on whether the caller is inside a
//! [`Transaction`]:
//!
//! - **No active transaction**: block on the lock for a bounded time, access,
//!   release. Blocking is safe because there is no larger atomic scope that
//!   could be part of a lock cycle.
//! - **Active transaction**: try the lock without blocking. On success the
//!   lock joins the transaction's locked set and stays held until the
//!   transaction ends. On failure the access reports a retry conflict and the
//!   whole transaction body is re-run from the start.
//!
//! The second path never waits while holding other locks, so transactions
//! cannot deadlock; a conflicting attempt costs one wasted run of the body.
//!
//! # Modules
//!
//! - [`lock`] -- The reentrant [`ObjectLock`] and its scoped guard
//! - [`transaction`] -- Thread-bound [`Transaction`] with its locked set
//! - [`retry`] -- [`run_transaction`], the explicit retry loop, and [`TxConfig`]
//! - [`error`] -- [`TxError`] and the [`Retryable`] classification

pub mod error;
pub mod lock;
pub mod retry;
pub mod transaction;

pub use error::{Retryable, TxError, TxResult};
pub use lock::{ObjectLock, ObjectLockGuard};
pub use retry::{run_transaction, TxConfig};
pub use transaction::{Transaction, TxState};

//! Transactions: an active flag plus the set of locks taken so far.
//!
//! Locks join the set on first access and stay held until commit or abort,
//! which release each of them exactly once.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::debug;

use crate::error::{TxError, TxResult};
use crate::lock::ObjectLock;

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a [`Transaction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    /// Accumulating locks.
    Active,
    /// Committed or aborted; holds no locks.
    Inactive,
}

/// Locks acquired by a transaction, in acquisition order.
#[derive(Default)]
struct LockedSet {
    locks: Vec<Arc<ObjectLock>>,
    /// Identity of every lock in `locks`, for idempotent recording.
    members: HashSet<*const ObjectLock>,
}

/// A thread-bound transaction context.
///
/// A transaction is created on one thread and can never leave it (it is
/// neither `Send` nor `Sync`). While active it accumulates the locks of every
/// object it touches; the set only grows. When the transaction ends, by
/// [`commit`](Self::commit), [`abort`](Self::abort), or drop, every lock in the
/// set is released exactly once.
///
/// The transaction is passed explicitly to field accessors; there is no
/// ambient "current transaction".
pub struct Transaction {
    id: u64,
    owner: ThreadId,
    state: Cell<TxState>,
    locked: RefCell<LockedSet>,
    _thread_bound: PhantomData<*const ()>,
}

impl Transaction {
    /// Begin a new active transaction on the calling thread.
    pub fn begin() -> Self {
        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(tx = id, "transaction begin");
        Self {
            id,
            owner: thread::current().id(),
            state: Cell::new(TxState::Active),
            locked: RefCell::new(LockedSet::default()),
            _thread_bound: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The thread this transaction is bound to.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn state(&self) -> TxState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == TxState::Active
    }

    /// Try-lock `lock` on behalf of this transaction, without blocking.
    ///
    /// On success the lock is recorded in the locked set and stays held until
    /// the transaction ends. Acquiring a lock already in the set succeeds
    /// without touching it. If another thread owns the lock, returns
    /// [`TxError::Retry`].
    pub fn acquire(&self, lock: &Arc<ObjectLock>) -> TxResult<()> {
        if !self.is_active() {
            return Err(TxError::NotActive { id: self.id });
        }
        let mut locked = self.locked.borrow_mut();
        if locked.members.contains(&Arc::as_ptr(lock)) {
            return Ok(());
        }
        if !lock.try_lock() {
            debug!(tx = self.id, "try-lock failed; retry required");
            return Err(TxError::Retry { id: self.id });
        }
        locked.members.insert(Arc::as_ptr(lock));
        locked.locks.push(Arc::clone(lock));
        Ok(())
    }

    /// Returns `true` if `lock` is in this transaction's locked set.
    pub fn holds(&self, lock: &Arc<ObjectLock>) -> bool {
        self.locked.borrow().members.contains(&Arc::as_ptr(lock))
    }

    /// Number of locks currently held by this transaction.
    pub fn locked_count(&self) -> usize {
        self.locked.borrow().locks.len()
    }

    /// End the transaction successfully, releasing every held lock.
    pub fn commit(&self) -> TxResult<()> {
        self.finish("commit")
    }

    /// End the transaction unsuccessfully, releasing every held lock.
    ///
    /// Undoing writes made by the transaction is the coordinator's concern;
    /// this only ends the lock span.
    pub fn abort(&self) -> TxResult<()> {
        self.finish("abort")
    }

    fn finish(&self, outcome: &'static str) -> TxResult<()> {
        if !self.is_active() {
            return Err(TxError::NotActive { id: self.id });
        }
        self.state.set(TxState::Inactive);
        let locked = std::mem::take(&mut *self.locked.borrow_mut());
        for lock in &locked.locks {
            lock.unlock();
        }
        debug!(tx = self.id, outcome, released = locked.locks.len(), "transaction end");
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.finish("abort");
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("locked", &self.locked_count())
            .finish()
    }
}

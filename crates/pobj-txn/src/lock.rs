//! Per-object reentrant lock.
//!
//! [`ObjectLock`] is owned by a thread, not a guard, so a transaction can
//! take it in one call and release it at commit. Waits are always bounded.

use std::fmt;
use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Ownership state of an [`ObjectLock`].
#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    /// Number of outstanding acquisitions by `owner`.
    holds: u32,
}

impl LockState {
    fn try_acquire(&mut self, me: ThreadId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(me);
                self.holds = 1;
                true
            }
            Some(owner) if owner == me => {
                self.holds += 1;
                true
            }
            Some(_) => false,
        }
    }
}

/// Per-object reentrant mutex.
///
/// The lock is owned by a thread rather than a guard, so a transaction can
/// acquire it during one field access and release it when the transaction
/// ends. A thread that already owns the lock may acquire it again; it becomes
/// free once every acquisition has been matched by an [`unlock`](Self::unlock).
pub struct ObjectLock {
    state: Mutex<LockState>,
    available: Condvar,
}

impl ObjectLock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            available: Condvar::new(),
        }
    }

    /// Acquire without blocking. Returns `false` if another thread owns the lock.
    pub fn try_lock(&self) -> bool {
        let me = thread::current().id();
        self.state
            .lock()
            .expect("object lock poisoned")
            .try_acquire(me)
    }

    /// Acquire, waiting at most `timeout` for another owner to release.
    ///
    /// Returns `false` if the deadline passed first.
    pub fn lock_timeout(&self, timeout: Duration) -> bool {
        let me = thread::current().id();
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock().expect("object lock poisoned");
        loop {
            if state.try_acquire(me) {
                return true;
            }
            state = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    self.available
                        .wait_timeout(state, remaining)
                        .expect("object lock poisoned")
                        .0
                }
                None => self.available.wait(state).expect("object lock poisoned"),
            };
        }
    }

    /// Scoped variant of [`lock_timeout`](Self::lock_timeout): the returned
    /// guard releases one acquisition when dropped.
    pub fn lock_for(&self, timeout: Duration) -> Option<ObjectLockGuard<'_>> {
        self.lock_timeout(timeout)
            .then_some(ObjectLockGuard { lock: self })
    }

    /// Release one acquisition held by the calling thread.
    ///
    /// Returns `false` (and changes nothing) if the calling thread does not
    /// own the lock.
    pub fn unlock(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock().expect("object lock poisoned");
        if state.owner != Some(me) {
            return false;
        }
        state.holds -= 1;
        if state.holds == 0 {
            state.owner = None;
            drop(state);
            self.available.notify_one();
        }
        true
    }

    pub fn is_locked(&self) -> bool {
        self.state
            .lock()
            .expect("object lock poisoned")
            .owner
            .is_some()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        let me = thread::current().id();
        self.state.lock().expect("object lock poisoned").owner == Some(me)
    }

    /// Outstanding acquisitions by the current owner (0 when free).
    pub fn hold_count(&self) -> u32 {
        self.state.lock().expect("object lock poisoned").holds
    }
}

impl Default for ObjectLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().expect("object lock poisoned");
        f.debug_struct("ObjectLock")
            .field("owner", &state.owner)
            .field("holds", &state.holds)
            .finish()
    }
}

/// Releases one acquisition of an [`ObjectLock`] on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ObjectLockGuard<'a> {
    lock: &'a ObjectLock,
}

impl Drop for ObjectLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

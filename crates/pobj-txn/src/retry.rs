//! Retry loop for transaction bodies that hit lock conflicts.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Retryable, TxError};
use crate::transaction::Transaction;

/// Configuration for the transaction retry loop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    /// Restarts allowed after the first attempt before giving up.
    pub max_retries: u32,
    /// Pause before the first restart; grows linearly with each attempt.
    pub retry_backoff: Duration,
    /// Upper bound on a single pause.
    pub max_backoff: Duration,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            max_retries: 64,
            retry_backoff: Duration::from_micros(500),
            max_backoff: Duration::from_millis(20),
        }
    }
}

impl TxConfig {
    /// Pause before restart number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(attempt)
            .min(self.max_backoff)
    }
}

/// Run `body` as a transaction, restarting it on retry conflicts.
///
/// Each attempt gets a fresh [`Transaction`]. If the body returns `Ok`, the
/// transaction commits and the value is returned. If it returns an error that
/// [`is_retry`](Retryable::is_retry), the transaction aborts (releasing its
/// locks so the competing transaction can finish), the loop backs off, and
/// the body runs again from the start. Any other error aborts and is returned
/// as-is. After `max_retries` restarts the loop fails with
/// [`TxError::RetryLimitExceeded`].
///
/// The body may run several times; it must not leave effects outside the
/// transaction that a restart would duplicate.
pub fn run_transaction<T, E, F>(config: &TxConfig, mut body: F) -> Result<T, E>
where
    F: FnMut(&Transaction) -> Result<T, E>,
    E: Retryable + From<TxError>,
{
    let mut attempt: u32 = 0;
    loop {
        let tx = Transaction::begin();
        match body(&tx) {
            Ok(value) => {
                tx.commit()?;
                return Ok(value);
            }
            Err(err) if err.is_retry() => {
                tx.abort()?;
                attempt += 1;
                if attempt > config.max_retries {
                    warn!(attempts = attempt, "transaction retry limit exceeded");
                    return Err(TxError::RetryLimitExceeded { attempts: attempt }.into());
                }
                let pause = config.backoff(attempt);
                debug!(tx = tx.id(), attempt, ?pause, "retrying transaction");
                if !pause.is_zero() {
                    thread::sleep(pause);
                }
            }
            Err(err) => {
                tx.abort()?;
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::ObjectLock;
    use std::sync::{mpsc, Arc};

    fn quick(max_retries: u32) -> TxConfig {
        TxConfig {
            max_retries,
            retry_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn successful_body_commits_once() {
        let lock = Arc::new(ObjectLock::new());
        let mut runs = 0;
        let value = run_transaction(&quick(3), |tx| {
            runs += 1;
            tx.acquire(&lock)?;
            Ok::<_, TxError>(7)
        })
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(runs, 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn retry_conflicts_rerun_the_body() {
        let mut runs = 0;
        let value = run_transaction(&quick(5), |tx| {
            runs += 1;
            if runs < 3 {
                return Err(TxError::Retry { id: tx.id() });
            }
            Ok(runs)
        })
        .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn each_attempt_gets_a_fresh_transaction() {
        let mut ids = Vec::new();
        let _ = run_transaction(&quick(2), |tx| {
            ids.push(tx.id());
            Err::<(), _>(TxError::Retry { id: tx.id() })
        });
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn retry_limit_is_enforced() {
        let err = run_transaction(&quick(2), |tx| Err::<(), _>(TxError::Retry { id: tx.id() }))
            .unwrap_err();
        assert_eq!(err, TxError::RetryLimitExceeded { attempts: 3 });
    }

    #[test]
    fn other_errors_abort_without_retry() {
        let lock = Arc::new(ObjectLock::new());
        let mut runs = 0;
        let err = run_transaction(&quick(5), |tx| {
            runs += 1;
            tx.acquire(&lock)?;
            Err::<(), _>(TxError::NotActive { id: 0 })
        })
        .unwrap_err();
        assert_eq!(err, TxError::NotActive { id: 0 });
        assert_eq!(runs, 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn succeeds_once_contention_clears() {
        let lock = Arc::new(ObjectLock::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                assert!(lock.try_lock());
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                lock.unlock();
            })
        };
        held_rx.recv().unwrap();

        let mut runs = 0;
        let config = TxConfig {
            max_retries: 10_000,
            retry_backoff: Duration::from_micros(100),
            max_backoff: Duration::from_millis(1),
        };
        let result = run_transaction(&config, |tx| {
            runs += 1;
            if runs == 2 {
                release_tx.send(()).unwrap();
            }
            tx.acquire(&lock)?;
            Ok::<_, TxError>(tx.locked_count())
        });

        holder.join().unwrap();
        assert_eq!(result, Ok(1));
        assert!(runs >= 2);
        assert!(!lock.is_locked());
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let config = TxConfig {
            max_retries: 10,
            retry_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(5),
        };
        assert_eq!(config.backoff(1), Duration::from_millis(2));
        assert_eq!(config.backoff(2), Duration::from_millis(4));
        assert_eq!(config.backoff(3), Duration::from_millis(5));
    }

    #[test]
    fn config_from_toml() {
        let config: TxConfig = toml::from_str("max_retries = 3").unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_backoff, TxConfig::default().max_backoff);
    }
}

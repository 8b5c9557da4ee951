//! Access configuration for an object space.

use std::time::Duration;

use pobj_region::HeapConfig;
use pobj_txn::TxConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ObjectError, ObjectResult};

/// Configuration for an [`ObjectSpace`](crate::ObjectSpace).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// How long a non-transactional field access waits for an object's lock
    /// before failing with `LockTimeout`.
    pub lock_timeout: Duration,
    /// Retry loop settings for [`ObjectSpace::transaction`](crate::ObjectSpace::transaction).
    pub tx: TxConfig,
    /// Arena settings used by [`ObjectSpace::open_in_memory`](crate::ObjectSpace::open_in_memory).
    pub heap: HeapConfig,
}

impl SpaceConfig {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ObjectResult<Self> {
        toml::from_str(s).map_err(|e| ObjectError::Config(e.to_string()))
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            tx: TxConfig::default(),
            heap: HeapConfig::default(),
        }
    }
}

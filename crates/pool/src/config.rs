//! Pool configuration types

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What happens to callers waiting on a creation whose initiator went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AbandonPolicy {
    /// The factory runs in its own task; the initiator leaving does not
    /// affect it and waiters get the result.
    #[default]
    Detach,
    /// The factory runs inside the initiator's future; waiters fail with
    /// [`Error::CreationAbandoned`] if it is dropped.
    Fail,
    /// Like `Fail`, but waiters start over and one of them creates anew.
    Retry,
}

/// Configuration for a keyed resource pool
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Maximum number of instances (resident, being created, or draining)
    pub capacity: usize,
    /// How long `acquire` waits for a slot when every slot is borrowed
    pub acquire_timeout: Duration,
    /// How long `shutdown` waits for borrowed instances to come back
    pub drain_timeout: Duration,
    /// Upper bound on disposals running at the same time
    pub max_concurrent_disposals: usize,
    /// Behaviour when a creating caller is cancelled
    pub abandon_policy: AbandonPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            acquire_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
            max_concurrent_disposals: 4,
            abandon_policy: AbandonPolicy::Detach,
        }
    }
}

impl PoolConfig {
    /// Config with the given capacity and defaults elsewhere.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Validate pool configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::configuration("capacity must be greater than 0"));
        }
        if self.max_concurrent_disposals == 0 {
            return Err(Error::configuration(
                "max_concurrent_disposals must be greater than 0",
            ));
        }
        if self.acquire_timeout.is_zero() {
            return Err(Error::configuration(
                "acquire_timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

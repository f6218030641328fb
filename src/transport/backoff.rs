use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exponential backoff for throttled and failed RPC calls.
///
/// The retry loop in [`RpcClient::call`](super::RpcClient::call) owns the attempt
/// counter; this type only maps an attempt number to a delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound (exclusive) of the uniform jitter added after capping.
    pub max_jitter_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 3_000,
            max_delay_ms: 60_000,
            max_jitter_ms: 2_000,
            max_retries: 5,
        }
    }
}

impl BackoffPolicy {
    /// No waiting at all; for tests and local validators.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
            max_jitter_ms: 0,
            max_retries,
        }
    }

    /// `min(base * 2^attempt, max)` without jitter. `attempt` is 1 for the
    /// first retry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    pub fn with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        self.delay_for(attempt) + Duration::from_millis(jitter_ms)
    }

    pub fn random_jitter_ms(&self) -> u64 {
        if self.max_jitter_ms == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..self.max_jitter_ms)
    }

    /// Total attempts a call may make, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

//! Exponential backoff with jitter.
//!
//! Shared by the broadcast panel's token retries and the signalling transport's
//! own reconnection loop, so both follow the same backoff shape.

use std::time::Duration;

use rand::Rng;

const DEFAULT_BASE_MS: u64 = 1_000;
const DEFAULT_CAP_MS: u64 = 30_000;
const DEFAULT_JITTER_MS: u64 = 1_000;

/// Backoff policy: `delay(0) = 0`, `delay(n) = min(base * 2^(n-1), cap) + jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_ms: u64,
    cap_ms: u64,
    jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_ms: DEFAULT_BASE_MS,
            cap_ms: DEFAULT_CAP_MS,
            jitter_ms: DEFAULT_JITTER_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom base, cap and jitter width (all milliseconds)
    pub fn new(base_ms: u64, cap_ms: u64, jitter_ms: u64) -> Self {
        Self {
            base_ms,
            cap_ms,
            jitter_ms,
        }
    }

    /// Delay before attempt `attempt`, drawing jitter uniformly from `[0, jitter_ms)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.jitter_ms)
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Deterministic variant of [`RetryPolicy::delay`] with the jitter supplied by the caller.
    ///
    /// `jitter_ms` is clamped below the policy's jitter width.
    pub fn delay_with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let jitter = jitter_ms.min(self.jitter_ms.saturating_sub(1));
        Duration::from_millis(self.backoff_ms(attempt).saturating_add(jitter))
    }

    /// The capped exponential part without jitter
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return 0;
        }
        let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        self.base_ms.saturating_mul(factor).min(self.cap_ms)
    }
}

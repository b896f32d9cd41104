//! Backoff calculation for the gateway's opt-in retry loop.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff with jitter: `min(base_ms * 2^(attempt-1) + jitter, max_ms)`
/// where jitter is 0-25% of the uncapped delay. Attempt 0 means no wait.
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter).min(max_ms))
}

//! Backoff schedules with optional jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::{BackoffStrategy, RetryConfig, TransConfig};

/// Calculate exponential backoff delay (no jitter).
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add 0 to 10% random jitter to `delay`.
pub fn with_jitter(delay: Duration) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(delay_ms + jitter)
}

/// The ordered waits between dial attempts described by `config`.
///
/// One entry per retry; an empty schedule means a single attempt.
pub fn schedule(config: &RetryConfig) -> Vec<Duration> {
    let base_ms = config.interval_secs.saturating_mul(1000);
    let max_ms = config.max_interval_secs.saturating_mul(1000);

    (1..=config.attempts)
        .map(|attempt| match config.strategy {
            BackoffStrategy::Constant => Duration::from_millis(base_ms),
            BackoffStrategy::Exponential => calculate_backoff(attempt, base_ms, max_ms),
        })
        .map(|delay| if config.jitter { with_jitter(delay) } else { delay })
        .collect()
}

/// Upper bound on how long one command can take against the Trans server:
/// every dial attempt timing out, every retry wait (with maximum jitter),
/// then the full exchange deadline.
pub fn worst_case_duration(config: &TransConfig) -> Duration {
    let waits: Duration = schedule(&RetryConfig {
        jitter: false,
        ..config.retry.clone()
    })
    .into_iter()
    .sum();
    let waits = if config.retry.jitter {
        waits + waits / 10
    } else {
        waits
    };
    let dials = config.timeout() * config.retry.attempts.saturating_add(1);
    dials + waits + config.timeout()
}

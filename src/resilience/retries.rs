//! Retry logic.
//!
//! # Responsibilities
//! - Run a fallible async operation, retrying after each wait of a fixed
//!   schedule
//! - Return the last error once the schedule is exhausted
//!
//! # Design Decisions
//! - Only dialing is retried; exchanges never are (the command may have
//!   been applied)
//! - The schedule is a plain list of waits, computed once from config

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::observability::metrics;

/// Retries an operation following an ordered list of waits.
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    backoff: Vec<Duration>,
}

impl Retrier {
    pub fn new(backoff: Vec<Duration>) -> Self {
        Self { backoff }
    }

    /// Total attempts this retrier will make (first try included).
    pub fn max_attempts(&self) -> usize {
        self.backoff.len() + 1
    }

    /// Run `op` until it succeeds or the schedule runs out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        let mut waits = self.backoff.iter();
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let Some(delay) = waits.next() else {
                        return Err(e);
                    };
                    tracing::warn!(attempt, delay = ?delay, error = %e, "Retrying after error");
                    metrics::record_retry();
                    tokio::time::sleep(*delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dial to the Trans server:
//!     → backoff.rs (schedule of waits from config: constant or exponential, optional jitter)
//!     → retries.rs (run the dial, sleep, dial again, return last error)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for connection establishment
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;

pub use retries::Retrier;

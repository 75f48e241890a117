//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → listeners stop accepting → in-flight requests drain
//!             → last guard dropped → Shutdown::wait resolves
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownGuard, ShutdownListener};

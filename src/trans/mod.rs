//! Trans protocol client subsystem.
//!
//! # Data Flow
//! ```text
//! Command
//!     → client.rs (allow-list gate, fail fast)
//!     → connection.rs (dial with per-attempt timeout + retry schedule)
//!     → transceiver.rs (spawned exchange raced against the deadline)
//!         → greeting check ("220 Welcome.\n" / "521 Busy.\n")
//!         → encoder.rs (cmd:, fields, blobs, commit:1, end)
//!         → read until "end\n" or EOF
//!         → decoder.rs (key:value lines + blob escapes)
//!     → FieldMap
//! ```
//!
//! # Design Decisions
//! - One TCP connection per command; nothing is pooled
//! - Cancellation closes the connection, then joins the exchange task
//! - Characters outside Latin-1 are dropped, never rejected

pub mod client;
pub mod connection;
pub mod decoder;
pub mod encoder;
pub mod latin1;
pub mod mock;
pub mod transceiver;

pub use client::{AllowList, TransClient, TransHandler};
pub use decoder::DecodeError;

use std::time::Duration;
use thiserror::Error;

/// Greeting sent by a server ready to take a command.
pub const WELCOME_MESSAGE: &[u8] = b"220 Welcome.\n";

/// Greeting sent by a server refusing the connection.
pub const BUSY_MESSAGE: &[u8] = b"521 Busy.\n";

/// Terminates a command and a command response.
pub const END_MESSAGE: &[u8] = b"end\n";

/// Errors raised while talking to the Trans server.
#[derive(Debug, Error)]
pub enum TransError {
    /// Command name is not on the allow-list. No connection was attempted.
    #[error("invalid command - commands allowed: {allowed}")]
    InvalidCommand { allowed: AllowList },

    /// Every dial attempt failed.
    #[error("error connecting with trans server {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server greeted with something unexpected.
    #[error("unexpected greeting: {greeting:?}")]
    Protocol { greeting: String },

    /// The server refused the connection with the busy literal.
    #[error("trans server is busy")]
    Busy,

    /// The exchange did not finish before the deadline.
    #[error("trans command timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be parsed.
    #[error("error parsing response: {0}")]
    Decode(#[from] DecodeError),

    /// Read or write failure in the middle of an exchange.
    #[error("trans I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The exchange task panicked or was aborted.
    #[error("trans exchange task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl TransError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransError::InvalidCommand { .. } => "invalid_command",
            TransError::Connection { .. } => "connection",
            TransError::Protocol { .. } => "protocol",
            TransError::Busy => "busy",
            TransError::Timeout(_) => "timeout",
            TransError::Decode(_) => "decode",
            TransError::Io(_) => "io",
            TransError::Task(_) => "task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransError::InvalidCommand {
            allowed: AllowList::parse("transinfo|newad"),
        };
        assert_eq!(
            err.to_string(),
            "invalid command - commands allowed: [transinfo newad]"
        );

        let err = TransError::Protocol {
            greeting: "hello\n".into(),
        };
        assert_eq!(err.to_string(), "unexpected greeting: \"hello\\n\"");
        assert_eq!(TransError::Busy.kind(), "busy");
    }
}

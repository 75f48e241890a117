//! Trans client: allow-list gate, connect, exchange.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Instrument;

use crate::config::TransConfig;
use crate::domain::{Command, FieldMap};
use crate::observability::metrics;
use crate::resilience::{backoff, Retrier};
use crate::trans::{connection, transceiver, TransError};

/// Sends a single command to a Trans server.
#[async_trait]
pub trait TransHandler: Send + Sync {
    async fn send_command(&self, command: &Command) -> Result<FieldMap, TransError>;
}

/// Command names this gateway may forward. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList(Arc<[String]>);

impl AllowList {
    /// Parse a `|` separated list, ignoring blanks.
    pub fn parse(list: &str) -> Self {
        let names: Vec<String> = list
            .split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self(names.into())
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|allowed| allowed == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", name)?;
        }
        write!(f, "]")
    }
}

/// Talks the Trans text protocol over one fresh TCP connection per command.
#[derive(Debug, Clone)]
pub struct TransClient {
    addr: String,
    timeout: Duration,
    allowed: AllowList,
    retrier: Retrier,
}

impl TransClient {
    pub fn new(config: &TransConfig) -> Self {
        Self {
            addr: config.address(),
            timeout: config.timeout(),
            allowed: AllowList::parse(&config.allowed_commands),
            retrier: Retrier::new(backoff::schedule(&config.retry)),
        }
    }

    pub fn allowed_commands(&self) -> &AllowList {
        &self.allowed
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    /// Dial (with retries) then exchange. The exchange deadline starts once
    /// the connection is up; each dial attempt carries its own `timeout`, so
    /// the whole call is bounded by `backoff::worst_case_duration`.
    async fn send(&self, command: &Command) -> Result<FieldMap, TransError> {
        if !self.is_allowed(&command.name) {
            return Err(TransError::InvalidCommand {
                allowed: self.allowed.clone(),
            });
        }

        let conn = connection::connect(&self.addr, self.timeout, &self.retrier).await?;
        let span = tracing::debug_span!("trans_exchange", connection_id = %conn.id, command = %command.name);
        transceiver::exchange(conn.stream, command, self.timeout)
            .instrument(span)
            .await
    }
}

#[async_trait]
impl TransHandler for TransClient {
    async fn send_command(&self, command: &Command) -> Result<FieldMap, TransError> {
        let start = Instant::now();
        let result = self.send(command).await;
        match &result {
            Ok(fields) => {
                tracing::debug!(command = %command.name, fields = fields.len(), "Trans command executed");
                metrics::record_command(&command.name, "ok", start);
            }
            Err(e) => {
                tracing::error!(command = %command.name, error = %e, "Error sending trans command");
                metrics::record_command(&command.name, e.kind(), start);
            }
        }
        result
    }
}

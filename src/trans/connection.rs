//! Connection establishment to the Trans server.
//!
//! # Responsibilities
//! - Dial `host:port`, each attempt bounded by a timeout
//! - Retry failed dials following the configured backoff schedule
//! - Tag every connection with a unique id for log correlation

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;

use crate::resilience::Retrier;
use crate::trans::TransError;

/// Global counter for connection IDs; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a Trans connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trans-{}", self.0)
    }
}

/// An open connection to the Trans server.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub stream: TcpStream,
}

/// Dial `addr`, retrying per `retrier`. Returns the last error once the
/// schedule is exhausted.
pub async fn connect(
    addr: &str,
    attempt_timeout: Duration,
    retrier: &Retrier,
) -> Result<Connection, TransError> {
    let stream = retrier
        .run(|attempt| dial(addr, attempt_timeout, attempt))
        .await
        .map_err(|source| TransError::Connection {
            addr: addr.to_string(),
            source,
        })?;

    let connection = Connection {
        id: ConnectionId::new(),
        stream,
    };
    tracing::debug!(connection_id = %connection.id, addr = %addr, "Connected to trans server");
    Ok(connection)
}

async fn dial(addr: &str, attempt_timeout: Duration, attempt: usize) -> io::Result<TcpStream> {
    tracing::trace!(addr = %addr, attempt, "Dialing trans server");
    match tokio::time::timeout(attempt_timeout, TcpStream::connect(addr)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("dial timed out after {:?}", attempt_timeout),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("trans-"));
    }

    #[tokio::test]
    async fn connects_to_listening_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let conn = connect(&addr, Duration::from_secs(1), &Retrier::default())
            .await
            .unwrap();
        assert_eq!(conn.stream.peer_addr().unwrap().to_string(), addr);
    }

    #[tokio::test]
    async fn exhausted_retries_report_connection_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let retrier = Retrier::new(vec![Duration::from_millis(10)]);
        let err = connect(&addr, Duration::from_secs(1), &retrier)
            .await
            .unwrap_err();
        match err {
            TransError::Connection { addr: failed, .. } => assert_eq!(failed, addr),
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retry_reaches_late_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let server = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            let _ = listener.accept().await;
        });

        let retrier = Retrier::new(vec![Duration::from_millis(300)]);
        let conn = connect(&addr.to_string(), Duration::from_secs(1), &retrier).await;
        assert!(conn.is_ok());
        server.await.unwrap();
    }
}

//! In-process Trans server for tests.
//!
//! Speaks the server side of the protocol on `127.0.0.1:<ephemeral>`:
//! greets (or refuses when busy), collects the request through `end\n`,
//! answers with whatever the handler returns followed by `end\n`, and
//! records what it saw.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::trans::{BUSY_MESSAGE, END_MESSAGE, WELCOME_MESSAGE};

/// Builds the response body (without `end\n`) from the raw request.
pub type Handler = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

#[derive(Default)]
struct State {
    busy: bool,
    delay: Duration,
    handler: Option<Handler>,
    requests: Vec<Vec<u8>>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    connections: AtomicUsize,
    hangups: AtomicUsize,
}

impl Shared {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking handler must not wedge every later assertion.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A mock Trans server bound to a local ephemeral port.
pub struct MockTransServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept_task: JoinHandle<()>,
}

impl MockTransServer {
    /// Bind and start serving. Stops when dropped.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared::default());

        let accept_shared = Arc::clone(&shared);
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let shared = Arc::clone(&accept_shared);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(socket, &shared).await {
                                tracing::debug!(error = %e, "Mock trans connection ended with error");
                            }
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            addr,
            shared,
            accept_task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Set the function answering each request.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        self.shared.state().handler = Some(Arc::new(handler));
    }

    /// Refuse new connections with the busy greeting.
    pub fn set_busy(&self, busy: bool) {
        self.shared.state().busy = busy;
    }

    /// Wait this long after reading a request before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.shared.state().delay = delay;
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Connections the client closed while the server was still delaying.
    pub fn hangups(&self) -> usize {
        self.shared.hangups.load(Ordering::SeqCst)
    }

    /// Raw bytes received on each finished connection, in completion order.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.shared.state().requests.clone()
    }
}

impl Drop for MockTransServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_connection(mut socket: TcpStream, shared: &Shared) -> io::Result<()> {
    shared.connections.fetch_add(1, Ordering::SeqCst);
    let (busy, delay, handler) = {
        let state = shared.state();
        (state.busy, state.delay, state.handler.clone())
    };

    if busy {
        socket.write_all(BUSY_MESSAGE).await?;
        // Whatever the client still sends is recorded; a well-behaved
        // client sends nothing.
        let mut rest = Vec::new();
        let _ = tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut rest)).await;
        shared.state().requests.push(rest);
        return Ok(());
    }

    socket.write_all(WELCOME_MESSAGE).await?;
    let mut reader = BufReader::new(socket);
    let mut request = Vec::new();
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        request.extend_from_slice(&line);
        if line == END_MESSAGE {
            break;
        }
    }
    shared.state().requests.push(request.clone());

    if !delay.is_zero() {
        let mut peek = [0u8; 1];
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            read = reader.read(&mut peek) => {
                if matches!(read, Ok(0) | Err(_)) {
                    shared.hangups.fetch_add(1, Ordering::SeqCst);
                    return Ok(());
                }
            }
        }
    }

    let socket = reader.get_mut();
    if let Some(handler) = handler {
        socket.write_all(&handler(&request)).await?;
    }
    socket.write_all(END_MESSAGE).await?;
    socket.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_line(reader: &mut BufReader<TcpStream>) -> Vec<u8> {
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn no_handler_answers_end() {
        let srv = MockTransServer::start().await.unwrap();
        let mut conn = BufReader::new(TcpStream::connect(srv.addr()).await.unwrap());

        assert_eq!(read_line(&mut conn).await, WELCOME_MESSAGE);
        conn.get_mut().write_all(b"cmd:foo\ncommit:1\nend\n").await.unwrap();
        assert_eq!(read_line(&mut conn).await, END_MESSAGE);
        assert_eq!(srv.requests(), vec![b"cmd:foo\ncommit:1\nend\n".to_vec()]);
    }

    #[tokio::test]
    async fn handler_sees_request() {
        let srv = MockTransServer::start().await.unwrap();
        srv.set_handler(|args| {
            assert_eq!(args, b"cmd:foo\ncommit:1\nend\n");
            b"foo:bar\n".to_vec()
        });
        let mut conn = BufReader::new(TcpStream::connect(srv.addr()).await.unwrap());

        assert_eq!(read_line(&mut conn).await, WELCOME_MESSAGE);
        conn.get_mut().write_all(b"cmd:foo\ncommit:1\nend\n").await.unwrap();
        assert_eq!(read_line(&mut conn).await, b"foo:bar\n");
        assert_eq!(read_line(&mut conn).await, END_MESSAGE);
        assert_eq!(srv.connections(), 1);
    }

    #[tokio::test]
    async fn busy_refuses() {
        let srv = MockTransServer::start().await.unwrap();
        srv.set_busy(true);
        let mut conn = BufReader::new(TcpStream::connect(srv.addr()).await.unwrap());

        assert_eq!(read_line(&mut conn).await, BUSY_MESSAGE);
        conn.get_mut().shutdown().await.unwrap();
        let mut rest = Vec::new();
        conn.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}

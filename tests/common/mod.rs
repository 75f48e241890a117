//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use trans_gateway::config::{ListenerConfig, TransConfig};
use trans_gateway::http::{AppState, HttpServer};
use trans_gateway::lifecycle::Shutdown;
use trans_gateway::loggers::TracingInteractorLogger;
use trans_gateway::repository::TransRepo;
use trans_gateway::trans::mock::MockTransServer;
use trans_gateway::trans::TransClient;
use trans_gateway::usecases::{TokenValidator, TransInteractor};

/// Client config pointing at `mock`, allowing `allowed` commands.
pub fn trans_config(mock: &MockTransServer, allowed: &str) -> TransConfig {
    TransConfig {
        host: mock.host(),
        port: mock.port(),
        timeout_secs: 5,
        allowed_commands: allowed.to_string(),
        ..TransConfig::default()
    }
}

/// Echo handler: answers every request line back, so each parameter the
/// client sent comes back as a field.
pub fn echo(request: &[u8]) -> Vec<u8> {
    let mut out = b"status:TRANS_OK\n".to_vec();
    for line in request.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b"cmd:") || line.starts_with(b"commit:") || line == b"end\n" {
            continue;
        }
        out.extend_from_slice(line);
    }
    out
}

/// A gateway served on an ephemeral local port.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Option<Shutdown>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.trigger();
            tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
                .await
                .expect("gateway did not shut down");
        }
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        if let Some(shutdown) = &self.shutdown {
            shutdown.trigger();
        }
        self.task.abort();
    }
}

pub async fn start_gateway(trans: TransConfig, api_key: &str) -> TestGateway {
    start_gateway_with(trans, api_key, ListenerConfig::default()).await
}

pub async fn start_gateway_with(
    trans: TransConfig,
    api_key: &str,
    listener_config: ListenerConfig,
) -> TestGateway {
    let repository = Arc::new(TransRepo::new(Arc::new(TransClient::new(&trans))));
    let state = AppState {
        interactor: Arc::new(TransInteractor::new(
            repository,
            Arc::new(TracingInteractorLogger),
        )),
        tokens: Arc::new(TokenValidator::new(api_key)),
    };
    let server = HttpServer::new(&listener_config, state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.register()));

    TestGateway {
        addr,
        shutdown: Some(shutdown),
        task,
    }
}

/// HTTP client without connection pooling or proxies.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

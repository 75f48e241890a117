//! Trans gateway
//!
//! Exposes legacy Trans servers over a JSON/HTTP API.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP client
//!       │  POST /api/v1/execute/{command}
//!       ▼
//!   ┌─────────────┐   ┌─────────────┐   ┌────────────┐   ┌─────────────┐
//!   │ http server │──▶│ interactor  │──▶│ TransRepo  │──▶│ TransClient │──▶ Trans server
//!   │ (axum)      │   │ (use case)  │   │ (gateway)  │   │ (TCP)       │
//!   └─────────────┘   └─────────────┘   └────────────┘   └─────────────┘
//!
//!   Cross-cutting: config, observability (tracing + metrics), resilience
//!   (dial retries), lifecycle (signals + graceful shutdown)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use trans_gateway::config::load_config;
use trans_gateway::http::{tls, AppState, HttpServer};
use trans_gateway::lifecycle::{signals, Shutdown};
use trans_gateway::loggers::TracingInteractorLogger;
use trans_gateway::observability::{logging, metrics};
use trans_gateway::repository::TransRepo;
use trans_gateway::trans::TransClient;
use trans_gateway::usecases::{TokenValidator, TransInteractor};

/// Requests still running after this long are abandoned on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "trans-gateway", version, about = "HTTP gateway for Trans servers")]
struct Args {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("trans-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let client = TransClient::new(&config.trans);
    tracing::info!(
        trans_address = %config.trans.address(),
        timeout_secs = config.trans.timeout_secs,
        allowed_commands = %client.allowed_commands(),
        "Trans client configured"
    );

    let repository = Arc::new(TransRepo::new(Arc::new(client)));
    let interactor = Arc::new(TransInteractor::new(repository, Arc::new(TracingInteractorLogger)));
    let tokens = TokenValidator::new(config.auth.api_key.clone());
    if !tokens.is_enabled() {
        tracing::warn!("API key is empty; token validation disabled");
    }
    let state = AppState {
        interactor,
        tokens: Arc::new(tokens),
    };

    let server = HttpServer::new(&config.listener, state);
    let shutdown = Shutdown::new();
    let listener = shutdown.register();

    let mut serve = match &config.listener.tls {
        Some(tls_config) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let rustls = tls::load_tls_config(tls_config).await?;
            tokio::spawn(server.run_tls(addr, rustls, listener))
        }
        None => {
            let tcp = TcpListener::bind(&config.listener.bind_address).await?;
            tokio::spawn(server.run(tcp, listener))
        }
    };

    tokio::select! {
        _ = signals::wait_for_signal() => {
            tracing::info!("Shutdown signal received");
        }
        result = &mut serve => {
            // The server stopped on its own; report why and exit.
            shutdown.trigger();
            return match result? {
                Ok(()) => Ok(()),
                Err(e) => {
                    tracing::error!(error = %e, "HTTP server failed");
                    Err(e.into())
                }
            };
        }
    }

    shutdown.trigger();
    match tokio::time::timeout(SHUTDOWN_GRACE, shutdown.wait()).await {
        Ok(()) => {
            if let Ok(Err(e)) = serve.await {
                tracing::error!(error = %e, "HTTP server failed during shutdown");
            }
        }
        Err(_) => {
            tracing::warn!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Shutdown grace period expired");
            serve.abort();
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

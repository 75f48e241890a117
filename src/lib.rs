//! HTTP gateway for legacy Trans servers.

// Core
pub mod domain;
pub mod trans;

// Application
pub mod loggers;
pub mod repository;
pub mod usecases;

// Front end
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

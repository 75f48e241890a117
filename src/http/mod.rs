//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (version check, token, JSON body)
//!     → builder.rs (JSON params → Command)
//!     → usecases::ExecuteCommand
//!     → response.rs (outcome → status code + JSON body)
//! ```

pub mod builder;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod tls;

pub use builder::build_command;
pub use request::X_REQUEST_ID;
pub use response::{ErrorBody, ExecuteOutput};
pub use server::{AppState, HttpServer};

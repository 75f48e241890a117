//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides, <VAR>_FILE secrets)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc / clones to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the allow-list never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, BackoffStrategy, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RetryConfig, TlsConfig, TransConfig,
};

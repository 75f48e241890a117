//! Application use cases.

pub mod execute_command;
pub mod validate_token;

pub use execute_command::{
    ExecuteCommand, ExecuteError, ExecuteFailure, InteractorLogger, TransInteractor,
};
pub use validate_token::{InvalidToken, TokenValidator};

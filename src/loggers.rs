//! [`InteractorLogger`] backed by `tracing` and the metrics facade.

use crate::domain::Command;
use crate::observability::metrics;
use crate::usecases::InteractorLogger;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInteractorLogger;

impl InteractorLogger for TracingInteractorLogger {
    fn log_bad_input(&self, command: &Command) {
        tracing::debug!(?command, "Invalid trans command");
        metrics::record_event("bad_input");
    }

    fn log_repository_error(&self, command: &Command, error: &dyn std::error::Error) {
        tracing::error!(command = %command.name, error = %error, "Error executing trans command");
        metrics::record_event("repository_error");
    }
}

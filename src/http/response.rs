//! Response bodies and the mapping from use case outcomes to status codes.
//!
//! # Design Decisions
//! - Every outcome of a command that reached the use case carries the same
//!   `{"status", "response"}` body, errors included
//! - Gateway-side failures (auth, malformed JSON) use `{"error_message"}`
//! - Transport failures map to 502/503/504 so callers can tell a Trans
//!   server problem from a bad request

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{self, FieldMap};
use crate::trans::TransError;
use crate::usecases::{ExecuteError, ExecuteFailure};

/// `{"status": ..., "response": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteOutput {
    pub status: String,
    pub response: FieldMap,
}

impl From<domain::Response> for ExecuteOutput {
    fn from(response: domain::Response) -> Self {
        Self {
            status: response.status,
            response: response.fields,
        }
    }
}

/// `{"error_message": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_message: String,
}

impl ErrorBody {
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Status for a command the use case rejected.
pub fn failure_status(error: &ExecuteError) -> StatusCode {
    match error {
        ExecuteError::Validation(_) | ExecuteError::NoSuchCommand | ExecuteError::Database(_) => {
            StatusCode::BAD_REQUEST
        }
        ExecuteError::Repository { source, .. } => transport_status(source),
    }
}

fn transport_status(error: &TransError) -> StatusCode {
    match error {
        TransError::InvalidCommand { .. } => StatusCode::BAD_REQUEST,
        TransError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        TransError::Busy | TransError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        TransError::Protocol { .. }
        | TransError::Decode(_)
        | TransError::Io(_)
        | TransError::Task(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Render the outcome of the execute use case.
pub fn execute_response(outcome: Result<domain::Response, ExecuteFailure>) -> Response {
    match outcome {
        Ok(response) => {
            let status = if response.is_server_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::OK
            };
            (status, Json(ExecuteOutput::from(response))).into_response()
        }
        Err(ExecuteFailure { mut response, error }) => {
            response
                .fields
                .entry("error".to_string())
                .or_insert_with(|| error.to_string());
            (failure_status(&error), Json(ExecuteOutput::from(response))).into_response()
        }
    }
}

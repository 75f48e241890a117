//! Route handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::builder::build_command;
use crate::http::request::request_id;
use crate::http::response::{execute_response, ErrorBody};
use crate::http::server::AppState;

/// Body of `POST /api/{version}/execute/{command}`. May be empty.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

/// `v1`, `v2`, ... but not `v0` or `v01`.
pub fn is_valid_version(version: &str) -> bool {
    let Some(digits) = version.strip_prefix('v') else {
        return false;
    };
    !digits.is_empty() && !digits.starts_with('0') && digits.bytes().all(|b| b.is_ascii_digit())
}

pub async fn healthcheck(Path(version): Path<String>) -> Response {
    if !is_valid_version(&version) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({ "status": "OK" })).into_response()
}

pub async fn execute(
    State(state): State<AppState>,
    Path((version, command)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_valid_version(&version) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let request_id = request_id(&headers);

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if let Err(e) = state.tokens.clean_and_match(token) {
        tracing::warn!(request_id, command = %command, "Rejected request with invalid token");
        return ErrorBody {
            error_message: e.to_string(),
        }
        .with_status(StatusCode::UNAUTHORIZED);
    }

    let input = if body.iter().all(u8::is_ascii_whitespace) {
        ExecuteRequest::default()
    } else {
        match serde_json::from_slice::<ExecuteRequest>(&body) {
            Ok(input) => input,
            Err(e) => {
                tracing::debug!(request_id, error = %e, "Malformed execute body");
                return ErrorBody {
                    error_message: e.to_string(),
                }
                .with_status(StatusCode::BAD_REQUEST);
            }
        }
    };

    let command = build_command(&command, &input.params.unwrap_or_default());
    tracing::debug!(
        request_id,
        command = %command.name,
        parameters = command.parameters.len(),
        "Executing trans command"
    );

    execute_response(state.interactor.run(command).await)
}

//! Turns the JSON `params` object of an execute request into a [`Command`].
//!
//! ```text
//! {"params": {
//!     "ad_id": 12,                         → ad_id:12
//!     "tags": ["a", "b"],                  → tags:a, tags:b
//!     "blobs": [{"image": "<base64>"}],    → blob:<len>:image
//!     "extra": [{"k": "v"}]                → k:v
//! }}
//! ```
//!
//! Parameters follow the map's iteration order, which for
//! `serde_json::Map` is sorted by key.

use serde_json::{Map, Value as Json};

use crate::domain::{Command, Parameter, Value};

/// Parameter groups under this key are sent as blobs.
pub const BLOBS_KEY: &str = "blobs";

pub fn build_command(name: &str, params: &Map<String, Json>) -> Command {
    let mut command = Command::new(name);

    for (key, value) in params {
        match value {
            Json::Array(items) => {
                for item in items {
                    match item {
                        Json::Object(group) => {
                            let blob = key == BLOBS_KEY;
                            for (inner_key, inner) in group {
                                push_scalar(&mut command, inner_key, inner, blob);
                            }
                        }
                        scalar => push_scalar(&mut command, key, scalar, false),
                    }
                }
            }
            scalar => push_scalar(&mut command, key, scalar, false),
        }
    }

    command
}

fn push_scalar(command: &mut Command, key: &str, value: &Json, blob: bool) {
    match scalar(value) {
        Some(value) => command.parameters.push(Parameter {
            key: key.to_string(),
            value,
            blob,
        }),
        None => tracing::debug!(command = %command.name, key, "Skipping non-scalar parameter"),
    }
}

fn scalar(value: &Json) -> Option<Value> {
    match value {
        Json::String(s) => Some(Value::Text(s.clone())),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

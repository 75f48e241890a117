//! Domain types shared by every layer of the gateway.
//!
//! A [`Command`] is built per HTTP request, handed to the use case, serialized
//! onto the Trans wire and answered with a [`Response`]. None of these values
//! outlive the request that created them.

use std::collections::HashMap;
use std::fmt;

/// Status returned when a Trans command executes successfully.
pub const TRANS_OK: &str = "TRANS_OK";

/// Generic error status reported by the Trans server.
pub const TRANS_ERROR: &str = "TRANS_ERROR";

/// Status prefix for errors raised by a database call inside a command.
pub const TRANS_DATABASE_ERROR: &str = "TRANS_DATABASE_ERROR";

/// Status reported when the server does not know the command.
pub const TRANS_NO_SUCH_COMMAND: &str = "TRANS_ERROR_NO_SUCH_COMMAND:Err no such command";

/// Decoded response fields, keyed by field name.
pub type FieldMap = HashMap<String, String>;

/// A scalar parameter value.
///
/// Non-text values are stringified when the command is serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One `key:value` line of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub key: String,
    pub value: Value,
    /// When set, `value` is base64 text carrying raw bytes.
    pub blob: bool,
}

impl Parameter {
    /// A plain (Latin-1 transcoded) parameter.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            blob: false,
        }
    }

    /// A blob parameter; `encoded` is the base64 form of the payload.
    pub fn blob(key: impl Into<String>, encoded: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Value::Text(encoded.into()),
            blob: true,
        }
    }
}

/// A command to execute on the Trans server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter, builder style.
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// The normalized answer to a [`Command`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Normally `TRANS_OK` or one of the error statuses.
    pub status: String,
    /// Every decoded field except `status`.
    pub fields: FieldMap,
}

impl Response {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            fields: FieldMap::new(),
        }
    }

    /// The `error` field, if the server or the gateway set one.
    pub fn error(&self) -> Option<&str> {
        self.fields.get("error").map(String::as_str)
    }

    /// True when the status or fields describe a server-reported failure.
    pub fn is_server_error(&self) -> bool {
        self.error().is_some() || self.status == TRANS_ERROR || self.status == TRANS_DATABASE_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_display_stringifies_scalars() {
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(1.5f64).to_string(), "1.5");
    }

    #[test]
    fn command_builder_keeps_order() {
        let cmd = Command::new("newad")
            .with(Parameter::new("a", "1"))
            .with(Parameter::blob("body", "ZWRnYXI="))
            .with(Parameter::new("b", 2i64));
        let keys: Vec<_> = cmd.parameters.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["a", "body", "b"]);
        assert!(cmd.parameters[1].blob);
    }

    #[test]
    fn server_error_classification() {
        assert!(!Response::with_status(TRANS_OK).is_server_error());
        assert!(Response::with_status(TRANS_ERROR).is_server_error());
        assert!(Response::with_status(TRANS_DATABASE_ERROR).is_server_error());

        let mut resp = Response::with_status("SOMETHING_ELSE");
        assert!(!resp.is_server_error());
        resp.fields.insert("error".into(), "boom".into());
        assert!(resp.is_server_error());
    }
}

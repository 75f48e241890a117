//! Command serialization.
//!
//! ```text
//! cmd:<name>\n
//! <key>:<value>\n                       plain parameter (Latin-1)
//! blob:<len>:<key>\n<len raw bytes>\n   blob parameter (base64 decoded)
//! commit:1\n
//! end\n
//! ```
//!
//! Values are not escaped. Parameters that cannot be represented are skipped
//! whole, never partially written.

use base64::{engine::general_purpose, Engine as _};

use crate::domain::{Command, Parameter};
use crate::trans::latin1;

/// Serialize `command` into the bytes the Trans server expects.
pub fn encode(command: &Command) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(b"cmd:");
    buf.extend_from_slice(command.name.as_bytes());
    buf.push(b'\n');

    for param in &command.parameters {
        let appended = if param.blob {
            append_blob(&mut buf, param)
        } else {
            append_field(&mut buf, param)
        };
        if !appended {
            tracing::debug!(
                command = %command.name,
                key = %param.key,
                blob = param.blob,
                "Skipping unencodable parameter"
            );
        }
    }

    buf.extend_from_slice(b"commit:1\nend\n");
    buf
}

fn append_field(buf: &mut Vec<u8>, param: &Parameter) -> bool {
    let Some(key) = latin1::encode(&param.key) else {
        return false;
    };
    let Some(value) = latin1::encode(&param.value.to_string()) else {
        return false;
    };
    buf.extend_from_slice(&key);
    buf.push(b':');
    buf.extend_from_slice(&value);
    buf.push(b'\n');
    true
}

fn append_blob(buf: &mut Vec<u8>, param: &Parameter) -> bool {
    let Some(encoded) = param.value.as_text() else {
        return false;
    };
    let Ok(payload) = general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    buf.extend_from_slice(format!("blob:{}:", payload.len()).as_bytes());
    buf.extend_from_slice(param.key.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(&payload);
    buf.push(b'\n');
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command() {
        let out = encode(&Command::new("transinfo"));
        assert_eq!(out, b"cmd:transinfo\ncommit:1\nend\n");
    }

    #[test]
    fn plain_fields_keep_order_and_stringify() {
        let cmd = Command::new("test")
            .with(Parameter::new("param1", "ok"))
            .with(Parameter::new("count", 3i64))
            .with(Parameter::new("flag", false));
        assert_eq!(
            encode(&cmd),
            b"cmd:test\nparam1:ok\ncount:3\nflag:false\ncommit:1\nend\n"
        );
    }

    #[test]
    fn blob_is_length_prefixed() {
        let cmd = Command::new("test").with(Parameter::blob("body", "ZWRnYXI="));
        assert_eq!(encode(&cmd), b"cmd:test\nblob:5:body\nedgar\ncommit:1\nend\n");
    }

    #[test]
    fn blob_carries_raw_bytes_untouched() {
        // 0x00 0xff 0x0a 0x3a
        let cmd = Command::new("img").with(Parameter::blob("data", "AP8KOg=="));
        let mut expected = b"cmd:img\nblob:4:data\n".to_vec();
        expected.extend_from_slice(&[0x00, 0xff, b'\n', b':']);
        expected.extend_from_slice(b"\ncommit:1\nend\n");
        assert_eq!(encode(&cmd), expected);
    }

    #[test]
    fn latin1_value_is_transcoded() {
        let cmd = Command::new("test").with(Parameter::new("param1", "okÁ"));
        assert_eq!(encode(&cmd), b"cmd:test\nparam1:ok\xc1\ncommit:1\nend\n");
    }

    #[test]
    fn unencodable_parameters_are_dropped_whole() {
        let cmd = Command::new("test")
            .with(Parameter::new("price", "5 €"))
            .with(Parameter::new("名前", "x"))
            .with(Parameter::blob("body", "not base64!"))
            .with(Parameter {
                key: "n".into(),
                value: 7i64.into(),
                blob: true,
            })
            .with(Parameter::new("kept", "yes"));
        assert_eq!(encode(&cmd), b"cmd:test\nkept:yes\ncommit:1\nend\n");
    }

    #[test]
    fn separators_are_not_escaped() {
        let cmd = Command::new("test").with(Parameter::new("k", "a:b"));
        assert_eq!(encode(&cmd), b"cmd:test\nk:a:b\ncommit:1\nend\n");
    }
}

//! Response decoding.
//!
//! A response body is a run of fields in two shapes:
//!
//! ```text
//! <key>:<value>\n
//! blob:<len>:<key>\n<len raw bytes>\n
//! ```
//!
//! Structure is parsed on raw bytes; keys and values are then mapped from
//! Latin-1, which cannot fail. Blob values go through the same byte-to-char
//! mapping, so they can be re-encoded losslessly.

use thiserror::Error;

use crate::domain::FieldMap;
use crate::trans::latin1;

const BLOB_PREFIX: &[u8] = b"blob:";

/// Malformed response framing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid blob header {0:?}")]
    InvalidBlob(String),

    #[error("cannot parse blob length {0:?}")]
    BlobLength(String),

    #[error("blob of {expected} bytes truncated to {available}")]
    TruncatedBlob { expected: usize, available: usize },

    #[error("invalid key-value format {0:?}")]
    MissingKey(String),

    #[error("newline is missing {0:?}")]
    MissingNewline(String),
}

/// Decode a response body (greeting and trailing `end\n` already removed).
///
/// Duplicate keys collapse to the last value.
pub fn decode(buf: &[u8]) -> Result<FieldMap, DecodeError> {
    let mut fields = FieldMap::new();
    for_each_field(buf, |key, value| {
        fields.insert(latin1::decode(key), latin1::decode(value));
    })?;
    Ok(fields)
}

/// Walk every field of `buf` in order.
pub fn for_each_field<'a>(
    buf: &'a [u8],
    mut f: impl FnMut(&'a [u8], &'a [u8]),
) -> Result<(), DecodeError> {
    let mut n = 0;
    while n < buf.len() {
        let rest = &buf[n..];

        let blob_len = if rest.starts_with(BLOB_PREFIX) {
            let header = &rest[BLOB_PREFIX.len()..];
            let i = find(header, b':').ok_or_else(|| DecodeError::InvalidBlob(lossy(rest)))?;
            let digits = &header[..i];
            let len = std::str::from_utf8(digits)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .ok_or_else(|| DecodeError::BlobLength(lossy(digits)))?;
            n += BLOB_PREFIX.len() + i + 1;
            Some(len)
        } else {
            None
        };

        // Blob keys run to the newline, plain keys to the first ':'.
        let terminator = if blob_len.is_some() { b'\n' } else { b':' };
        let i = find(&buf[n..], terminator).ok_or_else(|| DecodeError::MissingKey(lossy(&buf[n..])))?;
        let key = &buf[n..n + i];
        n += i + 1;

        let value_end = match blob_len {
            Some(len) if len > 0 => {
                let available = buf.len() - n;
                if len > available {
                    return Err(DecodeError::TruncatedBlob {
                        expected: len,
                        available,
                    });
                }
                n + len
            }
            _ => {
                let i = find(&buf[n..], b'\n')
                    .ok_or_else(|| DecodeError::MissingNewline(lossy(&buf[n..])))?;
                n + i
            }
        };

        f(key, &buf[n..value_end]);
        n = value_end + 1;
    }
    Ok(())
}

fn find(haystack: &[u8], byte: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == byte)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

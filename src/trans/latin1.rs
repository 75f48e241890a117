//! ISO-8859-1 transcoding.
//!
//! Latin-1 maps byte `n` to code point `U+00nn`, so decoding is total and
//! encoding only fails for characters above `U+00FF`.

/// Encode `text` as Latin-1, or `None` if any character falls outside it.
pub fn encode(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Decode Latin-1 bytes into a string. Never fails.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_ascii_and_latin1() {
        assert_eq!(encode("ok").as_deref(), Some(&b"ok"[..]));
        assert_eq!(encode("okÁ").as_deref(), Some(&b"ok\xc1"[..]));
        assert_eq!(encode("ñandú").as_deref(), Some(&b"\xf1and\xfa"[..]));
    }

    #[test]
    fn rejects_characters_above_latin1() {
        assert_eq!(encode("price €5"), None);
        assert_eq!(encode("日本"), None);
    }

    #[test]
    fn decode_maps_every_byte() {
        assert_eq!(decode(b"ok\xc1"), "okÁ");
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(encode(&decode(&all)).as_deref(), Some(&all[..]));
    }
}

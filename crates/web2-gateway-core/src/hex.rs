//! Hex codec for the DataLayer wire format.
//!
//! Keys and values travel to and from the store as lowercase hex strings,
//! optionally prefixed with `0x`. Decoding never fails: a malformed tail is
//! dropped at the first non-hex pair, so a bad upstream value degrades to
//! partial output instead of an error.

/// Encode the UTF-8 bytes of `text` as lowercase hex.
#[must_use]
pub fn encode(text: &str) -> String {
    ::hex::encode(text.as_bytes())
}

/// Decode a hex string into raw bytes.
///
/// Strips an optional `0x` prefix and stops at the first pair that is not
/// valid hex (a trailing odd nibble is ignored).
#[must_use]
pub fn decode_bytes(hex: &str) -> Vec<u8> {
    let digits = strip_prefix(hex).as_bytes();
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => break,
        }
    }
    out
}

/// Decode a hex string into text, replacing invalid UTF-8 with U+FFFD.
#[must_use]
pub fn decode(hex: &str) -> String {
    String::from_utf8_lossy(&decode_bytes(hex)).into_owned()
}

/// Strip an optional `0x` prefix.
#[must_use]
pub fn strip_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x").unwrap_or(hex)
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

//! Encoding normalization: heterogeneous wire encodings → raw bytes
//!
//! Upstream producers have historically emitted key material and ciphertext
//! as base64, as hex, and as serialized Node `Buffer` objects
//! (`{"type":"Buffer","data":[..]}`). Everything new is emitted as base64 via
//! [`to_base64`]; [`normalize`] remains as a compatibility shim so old blobs
//! stay readable. Detection order is structural: buffer-JSON, then hex, then
//! base64. A fully hex-shaped string is taken as hex even though it would
//! also decode as base64, but only from [`MIN_HEX_LEN`] characters up: the
//! shortest hex field legacy producers ever wrote is a 12-byte IV (24
//! chars), while short base64 ciphertexts collide with the hex grammar far
//! too often to guess on.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use lockit_core::{CryptoError, CryptoResult};

/// Shortest input the hex detector will claim (a hex-encoded 96-bit IV).
pub const MIN_HEX_LEN: usize = 24;

/// Canonical encoding for everything this crate emits.
pub fn to_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Strict base64 decode of a single field.
pub fn from_base64(input: &str) -> CryptoResult<Vec<u8>> {
    BASE64
        .decode(input.trim())
        .map_err(|e| CryptoError::Format(format!("invalid base64: {e}")))
}

#[derive(Deserialize)]
struct NodeBuffer {
    #[allow(dead_code)]
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Vec<u64>,
}

/// Convert any recognized wire encoding to raw bytes.
///
/// Recognized forms, tried in order:
/// 1. JSON object with a numeric `data` array (serialized Node `Buffer`)
/// 2. even-length string of at least [`MIN_HEX_LEN`] hex digits
/// 3. base64
pub fn normalize(input: &str) -> CryptoResult<Vec<u8>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::Format("empty input".into()));
    }

    if trimmed.starts_with('{') {
        return decode_buffer_json(trimmed);
    }

    if trimmed.len() >= MIN_HEX_LEN
        && trimmed.len() % 2 == 0
        && trimmed.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return hex::decode(trimmed)
            .map_err(|e| CryptoError::Format(format!("invalid hex: {e}")));
    }

    from_base64(trimmed)
}

fn decode_buffer_json(input: &str) -> CryptoResult<Vec<u8>> {
    let buffer: NodeBuffer = serde_json::from_str(input)
        .map_err(|e| CryptoError::Format(format!("unrecognized JSON buffer: {e}")))?;
    buffer
        .data
        .into_iter()
        .map(|n| {
            u8::try_from(n).map_err(|_| {
                CryptoError::Format(format!("buffer element {n} out of byte range"))
            })
        })
        .collect()
}

//! Helpers for `data:<mime>;base64,<payload>` strings sent by browsers and
//! the camera probe.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{EmotionError, Result};

/// Returns the payload segment: the text after the first comma, up to any
/// further comma. Everything before the first comma (the MIME prefix) is
/// ignored.
pub fn payload(data_url: &str) -> Result<&str> {
    let mut parts = data_url.split(',');
    parts.next();
    parts
        .next()
        .ok_or_else(|| EmotionError::Request("image is not a data URL (no comma before the payload)".into()))
}

/// Decodes the base64 payload of a data URL. Whitespace inside the payload
/// (line-wrapped encoders) is ignored.
pub fn decode(data_url: &str) -> Result<Vec<u8>> {
    let encoded: String = payload(data_url)?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(encoded)?)
}

/// Builds a data URL from raw bytes.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

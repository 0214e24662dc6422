//! Decoding for the base64-wrapped text fields cPanel returns from `parse_zone`.
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Decode a base64 field into text.
///
/// Malformed input yields an empty string so a single bad field never aborts
/// a whole zone snapshot. Invalid UTF-8 is replaced lossily.
pub fn decode(b64: &str) -> String {
    match BASE64.decode(b64) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

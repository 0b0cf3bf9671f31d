//! Preference codec: JSON in, percent-escaped cookie value out.
//!
//! Decoding is all-or-nothing and never fails outward: anything that does not
//! parse as the full, valid record is treated as an absent cookie.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::prefs::Preference;

/// Bytes RFC 6265 forbids in a cookie-octet, plus `%` so decoding is
/// unambiguous.
const COOKIE_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Attributes every preference cookie is written with.
pub const COOKIE_ATTRS: &str = "Path=/; SameSite=Lax; Max-Age=31536000";

pub fn encode<P: Preference>(value: &P) -> String {
    // a closed struct of enums, bools and numbers cannot fail to serialize
    let json = serde_json::to_string(value).unwrap_or_default();
    utf8_percent_encode(&json, COOKIE_ESCAPE).to_string()
}

/// Decode a raw cookie value, or `None` if it is malformed or out of domain.
pub fn decode_strict<P: Preference>(raw: &str) -> Option<P> {
    let json = percent_decode_str(raw).decode_utf8().ok()?;
    let value: P = serde_json::from_str(&json).ok()?;
    value.is_valid().then_some(value)
}

/// Decode a possibly-absent cookie value, falling back to the domain default.
pub fn decode<P: Preference>(raw: Option<&str>) -> P {
    raw.and_then(decode_strict).unwrap_or_default()
}

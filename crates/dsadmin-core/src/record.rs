//! # Shared Record Encoding
//!
//! Helpers used by both persistent stores: the catalog's fixed on-disk
//! text encoding and the credential file's fixed timestamp format.
//!
//! The catalog file is read and written as ISO-8859-1. Bytes map
//! one-to-one onto the first 256 Unicode code points, so decode/encode is
//! lossless and byte-stable for untouched content. Characters above
//! U+00FF (which can only enter through caller-supplied fragments) are
//! written as numeric character references.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp format used in the credential file, second precision, UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp in the credential file's fixed format.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a credential file timestamp. The stored value carries no zone
/// marker; it is UTC by convention.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Decode ISO-8859-1 bytes. Every byte value is a valid code point, so
/// this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a string as ISO-8859-1, writing characters above U+00FF as
/// numeric character references.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(byte) => out.push(byte),
            Err(_) => out.extend_from_slice(format!("&#{};", u32::from(ch)).as_bytes()),
        }
    }
    out
}

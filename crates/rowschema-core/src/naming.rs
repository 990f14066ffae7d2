//! Reversible escaping of identifiers into the Avro name alphabet
//!
//! Avro names are limited to `[A-Za-z0-9_]`. Every other UTF-16 code unit is
//! written as a six character token `_xhhhh` (lowercase hex). A literal `_x`
//! in the input is escaped first, so any `_xhhhh` token in an encoded name was
//! produced by the encoder.

use regex::Regex;
use std::sync::LazyLock;

static ESCAPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("_x[0-9a-f]{4}").expect("escape token pattern is valid")
});

/// Escaped form of the literal `_x` sequence
const ESCAPED_UNDERSCORE_X: &str = "_x005f_x0078";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Encode an arbitrary name into a valid Avro identifier
pub fn encode_name(name: &str) -> String {
    let protected = name.replace("_x", ESCAPED_UNDERSCORE_X);
    let mut out = String::with_capacity(protected.len());
    let mut units = [0u16; 2];

    for c in protected.chars() {
        if is_name_char(c) {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("_x{:04x}", unit));
            }
        }
    }

    out
}

/// Inverse of [`encode_name`]
///
/// Consecutive tokens are decoded together so surrogate pairs come back as a
/// single character. Names without any token are returned unchanged.
pub fn decode_name(name: &str) -> String {
    if !ESCAPE_TOKEN.is_match(name) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();
    let mut last_end = 0;

    for m in ESCAPE_TOKEN.find_iter(name) {
        if m.start() != last_end {
            flush_units(&mut pending, &mut out);
            out.push_str(&name[last_end..m.start()]);
        }
        // The pattern guarantees four hex digits
        if let Ok(unit) = u16::from_str_radix(&m.as_str()[2..], 16) {
            pending.push(unit);
        }
        last_end = m.end();
    }

    flush_units(&mut pending, &mut out);
    out.push_str(&name[last_end..]);
    out
}

fn flush_units(pending: &mut Vec<u16>, out: &mut String) {
    out.extend(char::decode_utf16(pending.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)));
}

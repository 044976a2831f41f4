use std::str::Chars;

use crate::error::{JsonLdError, Result};

/// Append `value` to `out` with N-Quads string escapes applied.
pub fn escape_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c < '\u{20}' || c == '\u{7f}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_into(&mut out, value);
    out
}

/// Resolve the escape sequences of an N-Quads string body.
pub fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let decoded = match chars.next() {
            Some('b') => '\u{8}',
            Some('t') => '\t',
            Some('n') => '\n',
            Some('f') => '\u{c}',
            Some('r') => '\r',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some('u') => {
                let high = read_hex(&mut chars, 4)?;
                if (0xD800..=0xDBFF).contains(&high) {
                    low_surrogate(&mut chars, high)?
                } else {
                    code_point(high)?
                }
            }
            Some('U') => code_point(read_hex(&mut chars, 8)?)?,
            Some(other) => {
                return Err(JsonLdError::syntax(format!(
                    "unknown escape sequence \\{other}"
                )));
            }
            None => return Err(JsonLdError::syntax("trailing backslash in string")),
        };
        out.push(decoded);
    }
    Ok(out)
}

fn read_hex(chars: &mut Chars<'_>, len: usize) -> Result<u32> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len {
        return Err(JsonLdError::syntax(format!(
            "incomplete unicode escape '{digits}'"
        )));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| JsonLdError::syntax(format!("invalid unicode escape '{digits}'")))
}

fn code_point(cp: u32) -> Result<char> {
    char::from_u32(cp).ok_or_else(|| JsonLdError::syntax(format!("invalid code point U+{cp:X}")))
}

fn low_surrogate(chars: &mut Chars<'_>, high: u32) -> Result<char> {
    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(JsonLdError::syntax(format!(
            "unpaired surrogate U+{high:X}"
        )));
    }
    let low = read_hex(chars, 4)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(JsonLdError::syntax(format!(
            "invalid low surrogate U+{low:X}"
        )));
    }
    code_point(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
}

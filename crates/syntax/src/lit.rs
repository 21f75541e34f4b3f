//! Go literal decoding: string and rune unquoting, integer literal parsing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LitError {
    #[error("literal is not quoted")]
    NotQuoted,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unescaped newline or quote inside literal")]
    InvalidChar,
}

/// Unquotes a Go string literal, either interpreted (`"..."`) or raw (`` `...` ``).
///
/// Raw strings drop carriage returns. Byte escapes (`\x..`, octal) that do not form
/// valid UTF-8 are replaced with U+FFFD.
pub fn unquote(raw: &str) -> Result<String, LitError> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 || bytes[0] != bytes[bytes.len() - 1] {
        return Err(LitError::NotQuoted);
    }
    let body = &raw[1..raw.len() - 1];

    match bytes[0] {
        b'`' => {
            if body.contains('`') {
                return Err(LitError::InvalidChar);
            }
            Ok(body.replace('\r', ""))
        }
        b'"' => unescape(body, b'"'),
        _ => Err(LitError::NotQuoted),
    }
}

/// Decodes the first character of a rune literal (`'a'`, `'\n'`, `'\x41'`) into its
/// code point.
pub fn unquote_char(raw: &str) -> Result<u32, LitError> {
    let body = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or(LitError::NotQuoted)?;

    let mut chars = body.chars();
    match chars.next() {
        None => Err(LitError::InvalidChar),
        Some('\\') => {
            let (value, _) = decode_escape(body.as_bytes(), 1, b'\'')?;
            Ok(value)
        }
        Some('\'' | '\n') => Err(LitError::InvalidChar),
        Some(c) => Ok(u32::from(c)),
    }
}

/// Parses a Go integer literal with `strconv.ParseInt(s, 0, 64)` semantics: optional
/// sign, `0x`/`0o`/`0b` prefixes, legacy octal for a leading `0`, and `_` separators.
pub fn parse_int(lit: &str) -> Option<i64> {
    let (negative, unsigned) = match lit.as_bytes().first()? {
        b'-' => (true, &lit[1..]),
        b'+' => (false, &lit[1..]),
        _ => (false, lit),
    };

    let lower = unsigned.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits, prefixed) = match lower.as_deref() {
        Some("0x") => (16, &unsigned[2..], true),
        Some("0o") => (8, &unsigned[2..], true),
        Some("0b") => (2, &unsigned[2..], true),
        _ if unsigned.len() > 1 && unsigned.starts_with('0') => (8, &unsigned[1..], true),
        _ => (10, unsigned, false),
    };

    if digits.contains('_') && !underscores_ok(digits, prefixed) {
        return None;
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }

    let magnitude = u64::from_str_radix(&cleaned, radix).ok()?;
    if negative {
        if magnitude == 1u64 << 63 {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// `_` must sit between digits, or directly after a base prefix.
fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    let bytes = digits.as_bytes();
    let mut prev_digit = prefixed;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let next_digit = bytes.get(i + 1).is_some_and(u8::is_ascii_alphanumeric);
            if !prev_digit || !next_digit {
                return false;
            }
            prev_digit = false;
        } else {
            prev_digit = true;
        }
    }
    true
}

fn unescape(body: &str, quote: u8) -> Result<String, LitError> {
    if !body.contains('\\') {
        if body.contains('\n') || body.as_bytes().contains(&quote) {
            return Err(LitError::InvalidChar);
        }
        return Ok(body.to_owned());
    }

    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let (value, next) = decode_escape(bytes, i + 1, quote)?;
                if is_byte_escape(bytes[i + 1]) {
                    out.push(value as u8);
                } else {
                    let c = char::from_u32(value).ok_or(LitError::InvalidEscape)?;
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                i = next;
            }
            b'\n' => return Err(LitError::InvalidChar),
            b if b == quote => return Err(LitError::InvalidChar),
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[inline]
fn is_byte_escape(b: u8) -> bool {
    b == b'x' || (b'0'..=b'7').contains(&b)
}

/// Decodes the escape whose selector byte is at `at` (just after the backslash).
/// Returns the decoded value and the index following the escape.
fn decode_escape(bytes: &[u8], at: usize, quote: u8) -> Result<(u32, usize), LitError> {
    let sel = *bytes.get(at).ok_or(LitError::InvalidEscape)?;
    let simple = match sel {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        b'n' => Some(u32::from(b'\n')),
        b'r' => Some(u32::from(b'\r')),
        b't' => Some(u32::from(b'\t')),
        b'v' => Some(0x0B),
        b'\\' => Some(u32::from(b'\\')),
        b'\'' | b'"' if sel == quote => Some(u32::from(sel)),
        _ => None,
    };
    if let Some(v) = simple {
        return Ok((v, at + 1));
    }

    let (radix, count, start) = match sel {
        b'x' => (16, 2, at + 1),
        b'u' => (16, 4, at + 1),
        b'U' => (16, 8, at + 1),
        b'0'..=b'7' => (8, 3, at),
        _ => return Err(LitError::InvalidEscape),
    };

    let digits = bytes
        .get(start..start + count)
        .and_then(|d| std::str::from_utf8(d).ok())
        .ok_or(LitError::InvalidEscape)?;
    let value = u32::from_str_radix(digits, radix).map_err(|_| LitError::InvalidEscape)?;

    let valid = match sel {
        b'0'..=b'7' => value <= 0xFF,
        b'u' | b'U' => char::from_u32(value).is_some(),
        _ => true,
    };
    if !valid {
        return Err(LitError::InvalidEscape);
    }

    Ok((value, start + count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquotes_interpreted_strings() {
        assert_eq!(unquote(r#""fmt""#).as_deref(), Ok("fmt"));
        assert_eq!(unquote(r#""a\"b\n""#).as_deref(), Ok("a\"b\n"));
        assert_eq!(unquote(r#""é\x41\101""#).as_deref(), Ok("éAA"));
        assert_eq!(unquote(r#""\q""#), Err(LitError::InvalidEscape));
        assert_eq!(unquote(r#""\'""#), Err(LitError::InvalidEscape));
    }

    #[test]
    fn unquotes_raw_strings() {
        assert_eq!(
            unquote("`json:\"id\"\r\n`").as_deref(),
            Ok("json:\"id\"\n")
        );
        assert_eq!(unquote("`abc"), Err(LitError::NotQuoted));
    }

    #[test]
    fn decodes_rune_literals() {
        assert_eq!(unquote_char("'a'"), Ok(97));
        assert_eq!(unquote_char(r"'\n'"), Ok(10));
        assert_eq!(unquote_char(r"'\x41'"), Ok(65));
        assert_eq!(unquote_char(r"'\''"), Ok(39));
        assert_eq!(unquote_char("'é'"), Ok(0xE9));
    }

    #[test]
    fn parses_go_integers() {
        assert_eq!(parse_int("10"), Some(10));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0x_ff"), Some(255));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("-8"), Some(-8));
        assert_eq!(parse_int("08"), None);
        assert_eq!(parse_int("1__0"), None);
        assert_eq!(parse_int("_1"), None);
        assert_eq!(parse_int("99999999999999999999"), None);
    }
}

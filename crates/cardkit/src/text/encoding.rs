//! Value escaping and quoted-printable transfer encoding.

use crate::core::VCardVersion;

/// Unescapes a text value.
///
/// 3.0/4.0 expand `\n`, `\N`, `\,`, `\;`, and `\\`. 2.1 does not define
/// backslash escaping for text values, so the input passes through.
#[must_use]
pub fn unescape_text(s: &str, version: VCardVersion) -> String {
    if version == VCardVersion::V2_1 {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n' | 'N') => {
                    chars.next();
                    result.push('\n');
                }
                Some(',') => {
                    chars.next();
                    result.push(',');
                }
                Some(';') => {
                    chars.next();
                    result.push(';');
                }
                Some('\\') => {
                    chars.next();
                    result.push('\\');
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Escapes a text value for the given version.
///
/// 3.0/4.0 escape backslash, comma, semicolon, and newline. 2.1 only
/// escapes backslash and semicolon; newlines in a 2.1 value must be
/// carried via quoted-printable, which the writer arranges.
#[must_use]
pub fn escape_text(s: &str, version: VCardVersion) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' if version != VCardVersion::V2_1 => result.push_str("\\,"),
            '\n' if version != VCardVersion::V2_1 => result.push_str("\\n"),
            '\r' if version != VCardVersion::V2_1 => {}
            _ => result.push(c),
        }
    }
    result
}

/// Splits a structured value on unescaped semicolons.
#[must_use]
pub fn split_structured(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev_backslash = false;

    for (i, c) in s.char_indices() {
        if c == '\\' {
            prev_backslash = !prev_backslash;
            continue;
        }

        if c == ';' && !prev_backslash {
            parts.push(&s[start..i]);
            start = i + 1;
        }

        prev_backslash = false;
    }

    parts.push(&s[start..]);
    parts
}

/// Splits a component on unescaped commas, unescaping each piece.
#[must_use]
pub fn split_component(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                match next {
                    ',' | ';' | '\\' => {
                        chars.next();
                        current.push(next);
                    }
                    'n' | 'N' => {
                        chars.next();
                        current.push('\n');
                    }
                    _ => current.push(c),
                }
            } else {
                current.push(c);
            }
        } else if c == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    parts.push(current);
    parts
}

/// Escapes a single structured-value component (keeps commas literal).
#[must_use]
pub fn escape_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' => result.push_str("\\,"),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Decodes quoted-printable data.
///
/// Soft breaks have already been joined by the reader. Returns the
/// decoded string plus a flag telling whether every escape was valid;
/// invalid escapes are passed through literally.
#[must_use]
pub fn decode_quoted_printable(s: &str) -> (String, bool) {
    let mut bytes = Vec::with_capacity(s.len());
    let mut clean = true;
    let input = s.as_bytes();
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'=' {
            if let (Some(&h), Some(&l)) = (input.get(i + 1), input.get(i + 2))
                && let (Some(hi), Some(lo)) = (hex_value(h), hex_value(l))
            {
                bytes.push(hi * 16 + lo);
                i += 3;
                continue;
            }
            clean = false;
            bytes.push(b'=');
            i += 1;
        } else {
            bytes.push(input[i]);
            i += 1;
        }
    }

    match String::from_utf8(bytes) {
        Ok(decoded) => (decoded, clean),
        Err(err) => (
            String::from_utf8_lossy(err.as_bytes()).into_owned(),
            false,
        ),
    }
}

/// Encodes a value as quoted-printable with `=` soft line breaks.
///
/// ASCII printables other than `=` pass through; everything else is
/// emitted as `=XX`. Soft breaks keep each physical line within the
/// 75-octet limit without relying on standard folding.
#[must_use]
pub fn encode_quoted_printable(s: &str, first_line_budget: usize) -> String {
    const LINE_BUDGET: usize = 75;

    let mut result = String::new();
    let mut line_len = first_line_budget;

    for byte in s.bytes() {
        let encoded: String = match byte {
            b'=' | b'\r' | b'\n' => format!("={byte:02X}"),
            0x20..=0x7E => char::from(byte).to_string(),
            _ => format!("={byte:02X}"),
        };

        // Reserve one octet for a possible trailing soft break.
        if line_len + encoded.len() > LINE_BUDGET - 1 {
            result.push_str("=\r\n");
            line_len = 0;
        }

        line_len += encoded.len();
        result.push_str(&encoded);
    }

    result
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_v3_expands_sequences() {
        assert_eq!(
            unescape_text(r"Line1\nLine2\, more\; done\\", VCardVersion::V3_0),
            "Line1\nLine2, more; done\\"
        );
    }

    #[test]
    fn unescape_v21_passes_through() {
        assert_eq!(
            unescape_text(r"Line1\nLine2", VCardVersion::V2_1),
            r"Line1\nLine2"
        );
    }

    #[test]
    fn escape_round_trip_v4() {
        let value = "a,b;c\\d\ne";
        let escaped = escape_text(value, VCardVersion::V4_0);
        assert_eq!(escaped, r"a\,b\;c\\d\ne");
        assert_eq!(unescape_text(&escaped, VCardVersion::V4_0), value);
    }

    #[test]
    fn escape_v21_leaves_commas() {
        assert_eq!(escape_text("a,b;c", VCardVersion::V2_1), r"a,b\;c");
    }

    #[test]
    fn split_structured_honors_escapes() {
        assert_eq!(split_structured(r"a;b\;c;d"), vec!["a", r"b\;c", "d"]);
    }

    #[test]
    fn split_component_unescapes() {
        assert_eq!(
            split_component(r"one,two\,half,three"),
            vec!["one", "two,half", "three"]
        );
        assert!(split_component("").is_empty());
    }

    #[test]
    fn quoted_printable_decode() {
        let (decoded, clean) = decode_quoted_printable("caf=C3=A9");
        assert_eq!(decoded, "café");
        assert!(clean);
    }

    #[test]
    fn quoted_printable_decode_invalid_escape() {
        let (decoded, clean) = decode_quoted_printable("a=ZZb");
        assert_eq!(decoded, "a=ZZb");
        assert!(!clean);
    }

    #[test]
    fn quoted_printable_encode_round_trip() {
        let encoded = encode_quoted_printable("café\nline", 0);
        let joined = encoded.replace("=\r\n", "");
        let (decoded, clean) = decode_quoted_printable(&joined);
        assert_eq!(decoded, "café\nline");
        assert!(clean);
    }

    #[test]
    fn quoted_printable_soft_breaks_cap_line_length() {
        let long = "x".repeat(300);
        let encoded = encode_quoted_printable(&long, 20);
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 75, "line too long: {}", line.len());
        }
    }
}

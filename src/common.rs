use std::convert::TryFrom;
/// Decimal, or `0x`/`0o`/`0b` prefixed, with an optional leading '-'. The sign may only appear
/// once, ahead of any prefix.
pub fn parse_numeric(raw: &str) -> Option<i64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = digits.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, digits)
    };

    // `from_str_radix` would accept a sign of its own.
    if digits.starts_with(|c: char| c == '-' || c == '+') {
        return None;
    }

    let magnitude = i128::from(u64::from_str_radix(digits, radix).ok()?);
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// Shortest round-tripping text for `x`, always with a '.' in the mantissa (`1e20` becomes `1.0e20`).
pub fn float_text(x: f64) -> String {
    let text = format!("{:?}", x);
    if !x.is_finite() || text.contains('.') {
        return text;
    }

    match text.find('e') {
        Some(idx) => format!("{}.0{}", &text[..idx], &text[idx..]),
        None => format!("{}.0", text),
    }
}

pub fn is_identifier(s: &str) -> bool {
    let mut cs = s.chars();
    match cs.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            cs.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// The contents of a `"..."` or `'...'` literal, if `s` is exactly one.
pub fn unquote(s: &str) -> Option<&str> {
    let mut cs = s.chars();
    match (cs.next(), cs.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '"' || open == '\'') => {
            Some(&s[1..s.len() - 1])
        }
        _ => None,
    }
}

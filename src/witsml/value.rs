use std::borrow::Cow;
use std::fmt;

/// A single coerced cell from a WITSML `data` row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Coerces one raw comma-separated token.
    ///
    /// Empty tokens become `Missing`, tokens that read as a float become
    /// `Number`, anything else is kept verbatim as `Text`. Never fails.
    pub fn coerce(token: &str) -> Self {
        if token.is_empty() {
            return CellValue::Missing;
        }

        match parse_float(token) {
            Some(value) => CellValue::Number(value),
            None => CellValue::Text(token.to_string()),
        }
    }

    /// Rendering used in the CSV body. Missing values and NaN are empty fields.
    pub fn as_csv_field(&self) -> Cow<'_, str> {
        match self {
            CellValue::Number(value) => Cow::Owned(format_number(*value)),
            CellValue::Text(text) => Cow::Borrowed(text.as_str()),
            CellValue::Missing => Cow::Borrowed(""),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_csv_field())
    }
}

/// Float parsing with the leniency well-log exports rely on: surrounding
/// whitespace is ignored, `inf`/`infinity`/`nan` are accepted in any case and
/// `_` may separate digits.
pub fn parse_float(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('_') {
        let cleaned = strip_digit_separators(trimmed)?;
        return cleaned.parse::<f64>().ok();
    }

    trimmed.parse::<f64>().ok()
}

// An underscore is only valid with an ASCII digit on both sides.
fn strip_digit_separators(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut cleaned = String::with_capacity(s.len());

    for (i, ch) in s.char_indices() {
        if ch == '_' {
            let before = i.checked_sub(1).map(|j| bytes[j]);
            let after = bytes.get(i + 1).copied();
            let between_digits = before.is_some_and(|b| b.is_ascii_digit())
                && after.is_some_and(|b| b.is_ascii_digit());
            if !between_digits {
                return None;
            }
        } else {
            cleaned.push(ch);
        }
    }

    Some(cleaned)
}

/// Shortest round-trip representation, always carrying a decimal point or an
/// exponent (`1.0`, `3.14`, `1e+16`, `1e-05`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}

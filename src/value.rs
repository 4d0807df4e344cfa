use std::fmt;

/// Every runtime value is text. Operators decide at use time whether the text
/// means a number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Value(String);

impl Value {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn from_bool(b: bool) -> Self {
        Self(if b { "1" } else { "0" }.to_string())
    }

    pub fn from_number(n: f64) -> Self {
        Self(format_number(n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only the exact text `1` is true.
    pub fn is_truthy(&self) -> bool {
        self.0 == "1"
    }

    /// Text made only of digits, `.` and `-` counts as numeric. This is a
    /// character-class test, not a parse: `"1-2"` is numeric, `"1,2"` is not.
    pub fn is_numeric(&self) -> bool {
        self.0
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    }

    /// Whether the text carries a usable number at all (numeric characters
    /// and at least one digit in its leading numeric prefix).
    pub fn parses_as_number(&self) -> bool {
        self.is_numeric() && numeric_prefix(&self.0).is_some()
    }

    /// Converts using the longest leading numeric prefix; `0` when there is
    /// none.
    pub fn to_number(&self) -> f64 {
        numeric_prefix(&self.0).unwrap_or(0.0)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical number text: six fractional digits, then trailing zeros and a
/// trailing `.` removed.
pub fn format_number(n: f64) -> String {
    let mut s = format!("{:.6}", n);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    s
}

/// Parses `[-]digits[.digits]` from the start of `text`, ignoring leading
/// whitespace and anything after the prefix.
fn numeric_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    text[..end].parse::<f64>().ok()
}

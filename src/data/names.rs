//! Identifier normalization and raw area cleaning.
//!
//! Stray spaces and inconsistent bracket spacing in compound names and
//! column headers are normalized once, at ingestion. Lookups always go
//! through [`name_key`], never through the raw text.

/// Spreadsheet tokens that mean "no value".
const MISSING_TOKENS: &[&str] = &[
    "", "N/A", "NA", "NULL", "NAN", "NONE", "#N/A", "#VALUE!", "#REF!", "#DIV/0!", "-",
];

/// Canonical lookup key for a compound, sample or column identifier.
///
/// - leading/trailing whitespace removed
/// - internal whitespace runs collapsed to a single space
/// - whitespace next to a bracket removed (`LPC 18:1 ( d7 )` → `LPC 18:1(d7)`)
/// - square brackets mapped to round ones (`[sn1]` → `(sn1)`)
pub fn name_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.trim().chars() {
        let c = match c {
            '[' => '(',
            ']' => ')',
            other => other,
        };
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        let is_bracket = c == '(' || c == ')';
        if pending_space && !is_bracket && !out.ends_with('(') {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

/// Display form of an identifier: trimmed, internal whitespace collapsed.
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outcome of cleaning a single raw area cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AreaCell {
    /// A finite, non-negative peak area.
    Value(f64),
    /// Blank cell or a recognized "missing" token.
    Missing,
    /// Text that is not a usable area (negative, non-finite, unparseable).
    Invalid,
}

/// Clean one raw area cell.
///
/// Thousands separators are accepted (`211,600`).
pub fn parse_area(raw: &str) -> AreaCell {
    let trimmed = raw.trim();
    if MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return AreaCell::Missing;
    }

    let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => AreaCell::Value(v),
        _ => AreaCell::Invalid,
    }
}

//! Column classification for area tables.
//!
//! Sample columns carry a sample number (`PH-HC_5676`). Reference columns
//! encode the numbering block they serve and a replicate index
//! (`NIST_5601-5700 (4)`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)\s*-\s*(\d+)\s*[\(\[]\s*(\d+)\s*[\)\]]")
            .expect("reference column pattern is valid")
    })
}

/// Numeric fields of a reference column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceTag {
    /// First sample number of the block.
    pub range_start: u32,
    /// Last sample number of the block.
    pub range_end: u32,
    /// Replicate index within the block (1-based).
    pub replicate: u32,
}

impl ReferenceTag {
    /// Extract `start-end (replicate)` from anywhere in a column name.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = reference_pattern().captures(name)?;
        Some(Self {
            range_start: caps[1].parse().ok()?,
            range_end: caps[2].parse().ok()?,
            replicate: caps[3].parse().ok()?,
        })
    }

    /// Whether a sample number falls inside this tag's block.
    pub fn covers(&self, sample_number: u32) -> bool {
        (self.range_start..=self.range_end).contains(&sample_number)
    }

    /// Block label, e.g. `5601-5700`.
    pub fn range_label(&self) -> String {
        format!("{}-{}", self.range_start, self.range_end)
    }
}

impl fmt::Display for ReferenceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({})", self.range_start, self.range_end, self.replicate)
    }
}

/// What a column of the area table holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// A patient sample. The number is absent when the name has no digits
    /// after the prefix.
    Sample { number: Option<u32> },
    /// A QC/NIST reference replicate.
    Reference(ReferenceTag),
    /// Anything else; ignored by the calculation.
    Other,
}

impl ColumnKind {
    pub fn is_sample(&self) -> bool {
        matches!(self, Self::Sample { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

/// Prefixes that distinguish sample columns from reference columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPrefixes {
    pub sample: String,
    pub reference: String,
}

impl Default for ColumnPrefixes {
    fn default() -> Self {
        Self {
            sample: "PH-HC_".to_string(),
            reference: "NIST_".to_string(),
        }
    }
}

impl ColumnPrefixes {
    pub fn new(sample: &str, reference: &str) -> Self {
        Self {
            sample: sample.to_string(),
            reference: reference.to_string(),
        }
    }

    /// Classify a column header. Prefix comparison ignores case and
    /// surrounding whitespace.
    pub fn classify(&self, header: &str) -> ColumnKind {
        let header = header.trim();
        if let Some(rest) = strip_prefix_ci(header, &self.reference) {
            return match ReferenceTag::parse(rest) {
                Some(tag) => ColumnKind::Reference(tag),
                None => ColumnKind::Other,
            };
        }
        if let Some(rest) = strip_prefix_ci(header, &self.sample) {
            return ColumnKind::Sample {
                number: sample_number(rest),
            };
        }
        ColumnKind::Other
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() || text.len() < prefix.len() || !text.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = text.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

/// Trailing ASCII digits of a name, if any (`PH-HC_0042` → `"0042"`).
pub fn sample_digits(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&trimmed[digits_start..])
}

/// Sample number from the trailing digits of a name (`PH-HC_0042` → 42).
///
/// `None` when there are no trailing digits or they do not fit in a `u32`;
/// [`sample_digits`] tells the two apart.
pub fn sample_number(name: &str) -> Option<u32> {
    sample_digits(name)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_tag_parse_variants() {
        let expected = ReferenceTag {
            range_start: 5601,
            range_end: 5700,
            replicate: 4,
        };
        assert_eq!(ReferenceTag::parse("NIST_5601-5700 (4)"), Some(expected));
        assert_eq!(ReferenceTag::parse("NIST_5601-5700(4)"), Some(expected));
        assert_eq!(ReferenceTag::parse(" QC_5601 - 5700 ( 4 ) "), Some(expected));
        assert_eq!(ReferenceTag::parse("NIST_5601-5700 [4]"), Some(expected));
        assert_eq!(ReferenceTag::parse("NIST_5601-5700"), None);
    }

    #[test]
    fn test_reference_tag_covers() {
        let tag = ReferenceTag::parse("NIST_1-100 (2)").unwrap();
        assert!(tag.covers(1));
        assert!(tag.covers(100));
        assert!(!tag.covers(101));
        assert_eq!(tag.range_label(), "1-100");
        assert_eq!(tag.to_string(), "1-100 (2)");
    }

    #[test]
    fn test_classify_columns() {
        let prefixes = ColumnPrefixes::default();
        assert_eq!(
            prefixes.classify("PH-HC_5676"),
            ColumnKind::Sample { number: Some(5676) }
        );
        assert_eq!(
            prefixes.classify("ph-hc_blank"),
            ColumnKind::Sample { number: None }
        );
        assert!(prefixes.classify(" NIST_1-100 (1) ").is_reference());
        assert_eq!(prefixes.classify("NIST_blank"), ColumnKind::Other);
        assert_eq!(prefixes.classify("Retention time"), ColumnKind::Other);
    }

    #[test]
    fn test_custom_prefixes() {
        let prefixes = ColumnPrefixes::new("S_", "REF_");
        assert!(prefixes.classify("REF_5601-5700 (1)").is_reference());
        assert!(prefixes.classify("S_12").is_sample());
        assert_eq!(prefixes.classify("NIST_1-100 (1)"), ColumnKind::Other);
    }

    #[test]
    fn test_sample_number() {
        assert_eq!(sample_number("PH-HC_0042"), Some(42));
        assert_eq!(sample_number("5676"), Some(5676));
        assert_eq!(sample_number("PH-HC_"), None);
        assert_eq!(sample_number("blank"), None);
    }

    #[test]
    fn test_sample_digits_beyond_u32() {
        assert_eq!(sample_digits("PH-HC_99999999999"), Some("99999999999"));
        assert_eq!(sample_number("PH-HC_99999999999"), None);
        assert_eq!(sample_number("PH-HC_4294967295"), Some(u32::MAX));
        assert_eq!(sample_digits("PH-HC_blank"), None);
    }
}

//! Feature string parsing (§6): `[+|-]tag[\[start:end\]][=value]`.

use otf_types::Tag;

use crate::error::ShapingError;

/// An inclusive/exclusive cluster range; `end = u32::MAX` means "to the end
/// of the buffer."
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterRange {
    pub start: u32,
    pub end: u32,
}

impl ClusterRange {
    pub const ALL: ClusterRange = ClusterRange {
        start: 0,
        end: u32::MAX,
    };

    pub fn contains(&self, cluster: u32) -> bool {
        cluster >= self.start && cluster < self.end
    }
}

/// A single feature request: a tag, a value (`0` disables, `1` enables,
/// `>1` selects an alternate or is otherwise "enabled"), and the cluster
/// range it applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feature {
    pub tag: Tag,
    pub value: u32,
    pub range: ClusterRange,
}

/// Parse one feature string per the §6 grammar.
pub fn parse(input: &str) -> Result<Feature, ShapingError> {
    let invalid = || ShapingError::InvalidFeature(input.to_string());
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut sign_value = 1u32;
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('-') {
        sign_value = 0;
        rest = stripped;
    }

    let (tag_and_range, explicit_value) = match rest.split_once('=') {
        Some((lhs, rhs)) => (lhs, Some(rhs)),
        None => (rest, None),
    };

    let (tag_str, range) = match tag_and_range.split_once('[') {
        Some((tag_str, bracketed)) => {
            let bracketed = bracketed.strip_suffix(']').ok_or_else(invalid)?;
            let (start_str, end_str) = bracketed.split_once(':').ok_or_else(invalid)?;
            let start: u32 = if start_str.is_empty() {
                0
            } else {
                start_str.parse().map_err(|_| invalid())?
            };
            let end: u32 = if end_str.is_empty() {
                u32::MAX
            } else {
                end_str.parse().map_err(|_| invalid())?
            };
            (tag_str, ClusterRange { start, end })
        }
        None => (tag_and_range, ClusterRange::ALL),
    };

    if tag_str.is_empty() || tag_str.len() > 4 || !tag_str.is_ascii() {
        return Err(invalid());
    }
    let tag = Tag::new_checked(tag_str.as_bytes()).map_err(|_| invalid())?;

    let value = match explicit_value {
        None => sign_value,
        Some(v) => match v {
            "on" | "true" | "yes" => 1,
            "off" | "false" | "no" => 0,
            numeric => numeric.parse::<u32>().map_err(|_| invalid())?,
        },
    };

    Ok(Feature { tag, value, range })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_tag_defaults_to_enabled_and_full_range() {
        let f = parse("liga").unwrap();
        assert_eq!(f.tag, Tag::new(b"liga"));
        assert_eq!(f.value, 1);
        assert_eq!(f.range, ClusterRange::ALL);
    }

    #[test]
    fn minus_prefix_disables() {
        let f = parse("-kern").unwrap();
        assert_eq!(f.value, 0);
    }

    #[test]
    fn explicit_value_overrides_sign() {
        let f = parse("+aalt=2").unwrap();
        assert_eq!(f.value, 2);
    }

    #[test]
    fn named_boolean_values() {
        assert_eq!(parse("liga=on").unwrap().value, 1);
        assert_eq!(parse("liga=off").unwrap().value, 0);
        assert_eq!(parse("liga=yes").unwrap().value, 1);
        assert_eq!(parse("liga=no").unwrap().value, 0);
    }

    #[test]
    fn cluster_range_brackets() {
        let f = parse("liga[3:7]").unwrap();
        assert_eq!(f.range, ClusterRange { start: 3, end: 7 });
        let f = parse("liga[3:]").unwrap();
        assert_eq!(f.range, ClusterRange { start: 3, end: u32::MAX });
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(parse("").is_err());
        assert!(parse("toolongtag").is_err());
        assert!(parse("liga[3").is_err());
    }
}

//! Maven toolchain requirement matching.
//!
//! `version` accepts either a plain version, compared segment by segment, or
//! a list of ranges such as `[11,17)` or `(,9],[11,)`. Every other key is an
//! exact, case-sensitive string comparison.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

pub const VERSION_KEY: &str = "version";

/// True when every requirement key is provided with a matching value.
pub fn matches_all(
    requirements: &BTreeMap<String, String>,
    provides: &BTreeMap<String, String>,
) -> bool {
    requirements.iter().all(|(key, required)| {
        provides
            .get(key)
            .is_some_and(|provided| matches_value(key, required, provided))
    })
}

pub fn matches_value(key: &str, required: &str, provided: &str) -> bool {
    if key == VERSION_KEY {
        matches_version(required, provided)
    } else {
        required == provided
    }
}

pub fn matches_version(required: &str, provided: &str) -> bool {
    let required = required.trim();
    if required.starts_with('[') || required.starts_with('(') {
        match parse_ranges(required) {
            Some(ranges) => ranges.iter().any(|range| range.contains(provided)),
            None => {
                debug!("Ignoring unparsable version range {}", required);
                false
            }
        }
    } else {
        compare_versions(required, provided) == Ordering::Equal
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Text(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            // Qualifiers such as `ea` sort before any release number.
            (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn segments(version: &str) -> Vec<Segment> {
    version
        .trim()
        .split(['.', '-', '_', '+'])
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<u64>() {
            Ok(number) => Segment::Number(number),
            Err(_) => Segment::Text(part.to_ascii_lowercase()),
        })
        .collect()
}

/// Missing trailing segments count as zero, so `17` equals `17.0.0`.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = segments(left);
    let right = segments(right);
    let len = left.len().max(right.len());
    let zero = Segment::Number(0);
    for index in 0..len {
        let a = left.get(index).unwrap_or(&zero);
        let b = right.get(index).unwrap_or(&zero);
        match a.cmp(b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Bound {
    version: String,
    inclusive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl VersionRange {
    fn contains(&self, version: &str) -> bool {
        let above_lower = self.lower.as_ref().map_or(true, |bound| {
            match compare_versions(version, &bound.version) {
                Ordering::Greater => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Less => false,
            }
        });
        let below_upper = self.upper.as_ref().map_or(true, |bound| {
            match compare_versions(version, &bound.version) {
                Ordering::Less => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Greater => false,
            }
        });
        above_lower && below_upper
    }
}

fn parse_ranges(raw: &str) -> Option<Vec<VersionRange>> {
    let mut ranges = Vec::new();
    let mut rest = raw.trim();
    while !rest.is_empty() {
        let open = rest.chars().next()?;
        if open != '[' && open != '(' {
            return None;
        }
        let close_at = rest.find([']', ')'])?;
        let close = rest[close_at..].chars().next()?;
        ranges.push(parse_range(open, &rest[1..close_at], close)?);

        rest = rest[close_at + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
            if rest.is_empty() {
                return None;
            }
        } else if !rest.is_empty() {
            return None;
        }
    }
    if ranges.is_empty() {
        None
    } else {
        Some(ranges)
    }
}

fn parse_range(open: char, body: &str, close: char) -> Option<VersionRange> {
    let lower_inclusive = open == '[';
    let upper_inclusive = close == ']';
    let bound = |text: &str, inclusive: bool| {
        let text = text.trim();
        (!text.is_empty()).then(|| Bound {
            version: text.to_string(),
            inclusive,
        })
    };

    match body.split_once(',') {
        None => {
            // `[17]` pins a single version.
            if !(lower_inclusive && upper_inclusive) || body.trim().is_empty() {
                return None;
            }
            let exact = bound(body, true);
            Some(VersionRange {
                lower: exact.clone(),
                upper: exact,
            })
        }
        Some((low, high)) => {
            if high.contains(',') {
                return None;
            }
            let range = VersionRange {
                lower: bound(low, lower_inclusive),
                upper: bound(high, upper_inclusive),
            };
            if let (Some(lower), Some(upper)) = (&range.lower, &range.upper) {
                if compare_versions(&lower.version, &upper.version) == Ordering::Greater {
                    return None;
                }
            }
            Some(range)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_versions_compare_by_segment() {
        assert!(matches_version("17", "17"));
        assert!(matches_version("17", "17.0"));
        assert!(matches_version("1.8", "1.8.0"));
        assert!(!matches_version("17", "17.0.2"));
        assert!(!matches_version("11", "17"));
        assert_eq!(compare_versions("17.0.10", "17.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("17-ea", "17"), Ordering::Less);
        assert_eq!(compare_versions("21+35", "21"), Ordering::Greater);
    }

    #[test]
    fn half_open_ranges() {
        assert!(matches_version("[11,17)", "11"));
        assert!(matches_version("[11,17)", "16.0.2"));
        assert!(!matches_version("[11,17)", "17"));
        assert!(!matches_version("(11,17]", "11"));
        assert!(matches_version("(11,17]", "17"));
        assert!(matches_version("[1.8,)", "21"));
        assert!(!matches_version("[1.8,)", "1.7"));
        assert!(matches_version("(,9]", "1.8"));
    }

    #[test]
    fn range_unions_and_exact_pins() {
        assert!(matches_version("(,9],[11,)", "8"));
        assert!(!matches_version("(,9],[11,)", "10"));
        assert!(matches_version("(,9],[11,)", "21"));
        assert!(matches_version("[17]", "17.0"));
        assert!(!matches_version("[17]", "17.0.1"));
    }

    #[test]
    fn malformed_ranges_never_match() {
        for range in ["[11,17", "(17)", "[17,11]", "[1,2,3]", "[11,17),", "[]"] {
            assert!(!matches_version(range, "11"), "{range}");
            assert!(!matches_version(range, "17"), "{range}");
        }
    }

    #[test]
    fn every_required_key_must_be_provided() {
        let provides = map(&[("version", "17.0"), ("vendor", "temurin")]);
        assert!(matches_all(&map(&[]), &provides));
        assert!(matches_all(&map(&[("version", "17")]), &provides));
        assert!(matches_all(
            &map(&[("version", "[17,18)"), ("vendor", "temurin")]),
            &provides
        ));
        assert!(!matches_all(&map(&[("vendor", "Temurin")]), &provides));
        assert!(!matches_all(&map(&[("id", "x")]), &provides));
    }
}

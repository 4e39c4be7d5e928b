//! Version parsing and constraint matching
//!
//! Versions are dot-separated sequences of non-negative integers of any
//! length (`1`, `1.2`, `1.2.3.4`). Shorter versions are padded with zeros
//! when compared, so `1.2` and `1.2.0` are the same version.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing versions and constraints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Invalid version format
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Invalid constraint format
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),
}

/// A parsed version: numeric components plus the text it was parsed from
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
    original: String,
}

/// Comparison operator of a [`Constraint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

/// Version constraint (`>=1.2.0`, `<2`, `=1.0`, or a bare version)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub op: Operator,
    pub version: Version,
}

impl Version {
    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        if s.is_empty() {
            return Err(VersionError::InvalidVersion("empty version".to_string()));
        }

        let parts = s
            .split('.')
            .map(|segment| {
                let segment = segment.trim();
                if segment.is_empty() {
                    return Err(VersionError::InvalidVersion(format!(
                        "empty segment in '{}'",
                        s
                    )));
                }
                if !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionError::InvalidVersion(format!(
                        "invalid segment '{}' in '{}'",
                        segment, s
                    )));
                }
                segment.parse::<u64>().map_err(|_| {
                    VersionError::InvalidVersion(format!("segment '{}' out of range", segment))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Version {
            parts,
            original: s.to_string(),
        })
    }

    /// Build a version from numeric components
    pub fn from_parts(parts: &[u64]) -> Self {
        Version {
            parts: parts.to_vec(),
            original: String::new(),
        }
    }

    /// Numeric components, as parsed (no padding)
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.original.is_empty() {
            return f.write_str(&self.original);
        }
        let joined = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

impl AsRef<Version> for Version {
    fn as_ref(&self) -> &Version {
        self
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl Operator {
    // Longer operators first so `<=` is not read as `<` followed by `=1.0`.
    const PREFIXES: [(&'static str, Operator); 6] = [
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("<", Operator::Lt),
        (">", Operator::Gt),
        ("==", Operator::EqEq),
        ("=", Operator::Eq),
    ];

    /// Whether a comparison result `version.cmp(bound)` satisfies this operator
    pub fn accepts(self, ord: Ordering) -> bool {
        match self {
            Operator::Eq | Operator::EqEq => ord == Ordering::Equal,
            Operator::Gt => ord == Ordering::Greater,
            Operator::Ge => ord != Ordering::Less,
            Operator::Lt => ord == Ordering::Less,
            Operator::Le => ord != Ordering::Greater,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::EqEq => "==",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Constraint {
    /// Parse a constraint string
    ///
    /// A string without an operator is an exact match on that version.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionError::InvalidConstraint("empty constraint".to_string()));
        }

        let (op, rest) = Operator::PREFIXES
            .iter()
            .find_map(|(prefix, op)| input.strip_prefix(*prefix).map(|rest| (*op, rest.trim())))
            .unwrap_or((Operator::Eq, input));

        if rest.is_empty() {
            return Err(VersionError::InvalidConstraint(format!(
                "missing version after '{}'",
                op
            )));
        }

        let version = Version::parse(rest)
            .map_err(|e| VersionError::InvalidConstraint(format!("'{}': {}", input, e)))?;

        Ok(Constraint { op, version })
    }

    /// Check if a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        self.op.accepts(version.cmp(&self.version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Pick the highest candidate satisfying `constraint`
///
/// `candidates` must already be sorted highest first. With no constraint
/// the first candidate wins.
pub fn select_best<'a, T: AsRef<Version>>(
    candidates: &'a [T],
    constraint: Option<&Constraint>,
) -> Option<&'a T> {
    match constraint {
        None => candidates.first(),
        Some(c) => candidates.iter().find(|candidate| c.matches(candidate.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_version() {
        let version = v("1.2.3");
        assert_eq!(version.parts(), &[1, 2, 3]);
        assert_eq!(version.to_string(), "1.2.3");
    }

    #[test]
    fn test_parse_single_and_long_versions() {
        assert_eq!(v("7").parts(), &[7]);
        assert_eq!(v("1.0.0.12").parts(), &[1, 0, 0, 12]);
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse(".1").is_err());
        assert!(Version::parse("1.").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("v1.2").is_err());
        assert!(Version::parse("1.-2").is_err());
        assert!(Version::parse("1.2.3-alpha").is_err());
    }

    #[test]
    fn test_display_keeps_original_text() {
        assert_eq!(v("01.2").to_string(), "01.2");
        assert_eq!(Version::from_parts(&[3, 1]).to_string(), "3.1");
    }

    #[test]
    fn test_padding_equality() {
        assert_eq!(v("1.2").cmp(&v("1.2.0")), Ordering::Equal);
        assert_eq!(v("1.2"), v("1.2.0.0"));
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(v("1.10").cmp(&v("1.9")), Ordering::Greater);
        assert_eq!(v("2").cmp(&v("1.9.9")), Ordering::Greater);
        assert_eq!(v("1.9.9").cmp(&v("2")), Ordering::Less);
    }

    #[test]
    fn test_operator_priority() {
        assert_eq!(Constraint::parse("<=1.0").unwrap().op, Operator::Le);
        assert_eq!(Constraint::parse(">=1.0").unwrap().op, Operator::Ge);
        assert_eq!(Constraint::parse("<1.0").unwrap().op, Operator::Lt);
        assert_eq!(Constraint::parse(">1.0").unwrap().op, Operator::Gt);
        assert_eq!(Constraint::parse("==1.0").unwrap().op, Operator::EqEq);
        assert_eq!(Constraint::parse("=1.0").unwrap().op, Operator::Eq);
        assert_eq!(Constraint::parse("1.0").unwrap().op, Operator::Eq);
    }

    #[test]
    fn test_constraint_whitespace() {
        let c = Constraint::parse("  >=  1.2.0 ").unwrap();
        assert_eq!(c.op, Operator::Ge);
        assert_eq!(c.version, v("1.2.0"));
    }

    #[test]
    fn test_constraint_missing_version() {
        assert!(matches!(
            Constraint::parse(">="),
            Err(VersionError::InvalidConstraint(_))
        ));
        assert!(matches!(
            Constraint::parse("   "),
            Err(VersionError::InvalidConstraint(_))
        ));
        assert!(matches!(
            Constraint::parse(">=abc"),
            Err(VersionError::InvalidConstraint(_))
        ));
    }

    #[test]
    fn test_matches_each_operator() {
        let one = v("1.0");
        let two = v("2.0");
        assert!(Constraint::parse("=1.0.0").unwrap().matches(&one));
        assert!(Constraint::parse("==1").unwrap().matches(&one));
        assert!(Constraint::parse(">1.0").unwrap().matches(&two));
        assert!(!Constraint::parse(">2.0").unwrap().matches(&two));
        assert!(Constraint::parse("<2").unwrap().matches(&one));
        assert!(!Constraint::parse("<1").unwrap().matches(&one));
        assert!(Constraint::parse("<=1.0.0").unwrap().matches(&one));
    }

    #[test]
    fn test_select_best_without_constraint() {
        let candidates = vec![v("3.0"), v("2.0")];
        assert_eq!(select_best(&candidates, None), Some(&candidates[0]));
        let empty: Vec<Version> = Vec::new();
        assert!(select_best(&empty, None).is_none());
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(Constraint::parse(">= 1.2").unwrap().to_string(), ">=1.2");
        assert_eq!(Constraint::parse("1.2").unwrap().to_string(), "=1.2");
    }
}

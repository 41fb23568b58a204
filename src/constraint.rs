use crate::{Comparator, DispatchError, Version};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One atomic version test: a package name, a comparison operator and a
/// target version literal. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{package}{comparator}{version}")]
pub struct VersionConstraint {
    pub package: String,
    pub comparator: Comparator,
    pub version: Version,
}

impl VersionConstraint {
    /// Whether the given installed version satisfies this constraint.
    pub fn is_satisfied_by(&self, installed: &Version) -> bool {
        self.comparator.compares(installed, &self.version)
    }
}

fn valid_package_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

impl FromStr for VersionConstraint {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let idx = raw
            .find(['<', '>', '='])
            .ok_or_else(|| DispatchError::SpecFormat(raw.to_string()))?;

        let bytes = raw.as_bytes();
        let op_len = match bytes[idx] {
            // A lone "=" is a malformed operator, not shorthand for "==".
            b'=' if bytes.get(idx + 1) != Some(&b'=') => {
                return Err(DispatchError::SpecFormat(raw.to_string()));
            }
            _ if bytes.get(idx + 1) == Some(&b'=') => 2,
            _ => 1,
        };
        let comparator: Comparator = raw[idx..idx + op_len].parse()?;

        let package = raw[..idx].trim();
        if package.is_empty() {
            return Err(DispatchError::SpecFormat(raw.to_string()));
        }
        if !valid_package_name(package) {
            return Err(DispatchError::InvalidConstraint(raw.to_string()));
        }

        let literal = raw[idx + op_len..].trim();
        if literal.is_empty() {
            return Err(DispatchError::SpecFormat(raw.to_string()));
        }
        let version: Version = literal.parse()?;

        Ok(VersionConstraint {
            package: package.to_string(),
            comparator,
            version,
        })
    }
}

/// An ordered conjunction of constraints: every one must hold for the clause
/// to match. Produced by splitting a specification string on `,` or `;`,
/// which are interchangeable.
///
/// # Examples
///
/// ```
/// use versiondispatch::Clause;
///
/// let clause: Clause = "rich>=1000 , pytest <= 1".parse().unwrap();
/// assert_eq!(clause.constraints().len(), 2);
/// assert_eq!(clause.constraints()[0].package, "rich");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    constraints: Vec<VersionConstraint>,
}

impl Clause {
    pub fn constraints(&self) -> &[VersionConstraint] {
        &self.constraints
    }

    /// The package names referenced by this clause, in declaration order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|c| c.package.as_str())
    }
}

impl FromStr for Clause {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut constraints = Vec::new();
        for part in s.split([',', ';']) {
            if part.trim().is_empty() {
                return Err(DispatchError::SpecFormat(s.trim().to_string()));
            }
            constraints.push(part.parse()?);
        }
        Ok(Clause { constraints })
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .constraints
            .iter()
            .map(VersionConstraint::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let clause: Clause = "rich<1.0".parse().unwrap();
        assert_eq!(clause.constraints().len(), 1);
        let constraint = &clause.constraints()[0];
        assert_eq!(constraint.package, "rich");
        assert_eq!(constraint.comparator, Comparator::LessThan);
        assert_eq!(constraint.version.to_string(), "1.0");
    }

    #[test]
    fn test_parse_all_operators() {
        for (spec, comparator) in [
            ("rich<1.0", Comparator::LessThan),
            ("rich<=1.0", Comparator::LessThanOrEqual),
            ("rich==1.0", Comparator::Equal),
            ("rich>=1.0", Comparator::GreaterThanOrEqual),
            ("rich>1.0", Comparator::GreaterThan),
        ] {
            let clause: Clause = spec.parse().unwrap();
            assert_eq!(clause.constraints()[0].comparator, comparator);
        }
    }

    #[test]
    fn test_parse_with_spaces() {
        let clause: Clause = " rich >= 1000 , pytest <= 1 ".parse().unwrap();
        assert_eq!(clause.constraints().len(), 2);
        assert_eq!(clause.constraints()[0].package, "rich");
        assert_eq!(clause.constraints()[1].package, "pytest");
    }

    #[test]
    fn test_separators_interchangeable() {
        let comma: Clause = "rich<1.0, pytest>1234.5.6".parse().unwrap();
        let semicolon: Clause = "rich<1.0;pytest>1234.5.6".parse().unwrap();
        assert_eq!(comma, semicolon);
    }

    #[test]
    fn test_package_name_charset() {
        let clause: Clause = "scikit-learn>=1.0".parse().unwrap();
        assert_eq!(clause.constraints()[0].package, "scikit-learn");
        let clause: Clause = "ruamel.yaml_clib==0.2".parse().unwrap();
        assert_eq!(clause.constraints()[0].package, "ruamel.yaml_clib");
    }

    #[test]
    fn test_missing_operator_is_format_error() {
        for bad in ["rich=1.0", "rich1.0", "rich", "rich=>1.0"] {
            let result = bad.parse::<Clause>();
            assert!(
                matches!(result, Err(DispatchError::SpecFormat(_))),
                "expected SpecFormat for {bad:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_empty_tokens_are_format_errors() {
        for bad in ["", "  ", "==1.0", "rich==", "rich<1.0,,pytest<2", "rich<1.0;"] {
            let result = bad.parse::<Clause>();
            assert!(
                matches!(result, Err(DispatchError::SpecFormat(_))),
                "expected SpecFormat for {bad:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_package_with_space_rejected() {
        assert_eq!(
            "rich kid==1.0".parse::<Clause>(),
            Err(DispatchError::InvalidConstraint("rich kid==1.0".to_string()))
        );
    }

    #[test]
    fn test_bad_version_literal() {
        assert_eq!(
            "rich==1.foo.0".parse::<Clause>(),
            Err(DispatchError::InvalidVersion("1.foo.0".to_string()))
        );
    }

    #[test]
    fn test_display() {
        let clause: Clause = "rich >= 1000 ; pytest<=1".parse().unwrap();
        assert_eq!(clause.to_string(), "rich>=1000, pytest<=1");
    }
}

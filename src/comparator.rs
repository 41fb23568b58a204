use crate::{DispatchError, Version};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five comparison operators supported by the specification grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Comparator {
    #[display("<")]
    LessThan,
    #[display("<=")]
    LessThanOrEqual,
    #[display("==")]
    Equal,
    #[display(">=")]
    GreaterThanOrEqual,
    #[display(">")]
    GreaterThan,
}

impl Comparator {
    /// Whether `installed` stands in this relation to `target`. Equality is
    /// `Version` equality, i.e. exact on the zero-padded component tuples.
    pub fn compares(self, installed: &Version, target: &Version) -> bool {
        match self {
            Comparator::LessThan => installed < target,
            Comparator::LessThanOrEqual => installed <= target,
            Comparator::Equal => installed == target,
            Comparator::GreaterThanOrEqual => installed >= target,
            Comparator::GreaterThan => installed > target,
        }
    }
}

impl FromStr for Comparator {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Comparator::LessThan),
            "<=" => Ok(Comparator::LessThanOrEqual),
            "==" => Ok(Comparator::Equal),
            ">=" => Ok(Comparator::GreaterThanOrEqual),
            ">" => Ok(Comparator::GreaterThan),
            other => Err(DispatchError::SpecFormat(other.to_string())),
        }
    }
}

/// Check a single relation between two version strings.
///
/// Fails when either side cannot be parsed as a version.
///
/// # Examples
///
/// ```
/// use versiondispatch::{Comparator, satisfies};
///
/// assert!(satisfies("0.1", Comparator::LessThan, "1.0").unwrap());
/// assert!(!satisfies("1.2.3.1", Comparator::Equal, "1.2.3").unwrap());
/// assert!(satisfies("1.2", Comparator::Equal, "1.2.0").unwrap());
/// ```
pub fn satisfies(
    installed: &str,
    comparator: Comparator,
    target: &str,
) -> Result<bool, DispatchError> {
    let installed: Version = installed.parse()?;
    let target: Version = target.parse()?;
    Ok(comparator.compares(&installed, &target))
}

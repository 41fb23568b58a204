use crate::DispatchError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A lenient dotted-numeric version: one or more integer components, with an
/// optional non-numeric suffix on the last component (e.g. a pre-release
/// tag). The suffix is preserved for display but ignored for ordering.
///
/// Components missing on one side compare as zero, so `1.2` and `1.2.0` are
/// equal, while `1.2.3` and `1.2.3.1` are not.
///
/// # Examples
///
/// ```
/// use versiondispatch::Version;
///
/// let a: Version = "4".parse().unwrap();
/// let b: Version = "3.11.12".parse().unwrap();
/// assert!(a > b);
///
/// let c: Version = "1.2".parse().unwrap();
/// let d: Version = "1.2.0".parse().unwrap();
/// assert_eq!(c, d);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Version {
    components: Vec<u64>,
    suffix: String,
}

impl Version {
    /// The numeric components as parsed, without zero padding.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// The trailing non-numeric suffix, empty when none was given.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl FromStr for Version {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(DispatchError::InvalidVersion(s.to_string()));
        }

        let parts: Vec<&str> = raw.split('.').collect();
        let mut components = Vec::with_capacity(parts.len());
        let mut suffix = String::new();

        for (idx, part) in parts.iter().enumerate() {
            let digits: &str = &part[..part
                .char_indices()
                .find(|(_, c)| !c.is_ascii_digit())
                .map_or(part.len(), |(i, _)| i)];
            if digits.is_empty() {
                return Err(DispatchError::InvalidVersion(raw.to_string()));
            }
            let component = digits
                .parse::<u64>()
                .map_err(|_| DispatchError::InvalidVersion(raw.to_string()))?;
            components.push(component);

            let rest = &part[digits.len()..];
            if !rest.is_empty() {
                // A suffix like "dev" or "-rc1" is only allowed on the final
                // component; "1.foo.0" stays an error.
                if idx != parts.len() - 1 {
                    return Err(DispatchError::InvalidVersion(raw.to_string()));
                }
                suffix = rest.to_string();
            }
        }

        Ok(Version { components, suffix })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dotted = self
            .components
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{dotted}{}", self.suffix)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

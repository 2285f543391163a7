//! Package identity value types.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a requested package: name, version range, and whether
/// prerelease versions may satisfy the range.
///
/// Equality, ordering, and hashing are by case-insensitive name only —
/// a product holds at most one resolved version of a given name at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    #[serde(default)]
    pub version_range: String,
    #[serde(default)]
    pub allow_prerelease: bool,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version_range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_range: version_range.into(),
            allow_prerelease: false,
        }
    }

    /// The case-insensitive key used for equality and store lookups
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version_range.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.version_range)
        }
    }
}

/// A package identity pinned to the concrete version the resolver chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedPackageInfo {
    pub id: PackageId,
    pub version: String,
}

impl VersionedPackageInfo {
    pub fn new(id: PackageId, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
        }
    }
}

impl fmt::Display for VersionedPackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_case_insensitive() {
        let a = PackageId::new("Newtonsoft.Json", "^13.0");
        let b = PackageId::new("newtonsoft.json", "^12.0");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_ordering_by_name() {
        let mut ids = vec![
            PackageId::new("zeta", ""),
            PackageId::new("Alpha", ""),
            PackageId::new("midway", ""),
        ];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "midway", "zeta"]);
    }

    #[test]
    fn test_display_includes_range() {
        let id = PackageId::new("core", "^1.0.0");
        assert_eq!(id.to_string(), "core (^1.0.0)");
        let bare = PackageId::new("core", "");
        assert_eq!(bare.to_string(), "core");
    }
}

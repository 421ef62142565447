use std::collections::HashMap;

use super::version::is_vulnerable;
use crate::model::{PackageList, VulnerablePackage};

/// Lookup table from package name to its vulnerable versions.
///
/// Built once per scan and only read afterwards, so it can be shared across
/// concurrent action scans behind an `Arc`. Names are case-sensitive and
/// scoped names (`@org/pkg`) are kept verbatim.
///
/// # Example
///
/// ```
/// use actscan::{VulnerabilityIndex, VulnerablePackage};
///
/// let index = VulnerabilityIndex::build(&[
///     VulnerablePackage::new("@ctrl/tinycolor", ["4.1.1"]),
/// ]);
///
/// assert!(index.lookup("@ctrl/tinycolor", "^4.1.0").is_some());
/// assert!(index.lookup("@ctrl/tinycolor", "4.1.0").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityIndex {
    packages: HashMap<String, VulnerablePackage>,
}

impl VulnerabilityIndex {
    /// Builds the index. When a name appears twice the later entry wins.
    pub fn build(packages: &[VulnerablePackage]) -> Self {
        let mut map = HashMap::with_capacity(packages.len());
        for package in packages {
            map.insert(package.name.clone(), package.clone());
        }
        Self { packages: map }
    }

    pub fn from_list(list: &PackageList) -> Self {
        Self::build(list.packages())
    }

    /// Returns the matching entry if `name` at `version` is vulnerable.
    pub fn lookup(&self, name: &str, version: &str) -> Option<&VulnerablePackage> {
        self.packages
            .get(name)
            .filter(|package| is_vulnerable(version, &package.versions))
    }

    /// Returns true if `name` is listed at all, regardless of version.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

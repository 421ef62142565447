//! `package-lock.json` scanner.
//!
//! Lockfile v2 and v3 carry a flat `packages` map keyed by install path:
//!
//! ```json
//! {
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "my-action" },
//!     "node_modules/@ctrl/tinycolor": {
//!       "version": "4.1.1",
//!       "resolved": "https://registry.npmjs.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz"
//!     }
//!   }
//! }
//! ```
//!
//! Only top-level installs are matched there. Lockfile v1 (or a v2 file
//! without `packages`) has a nested `dependencies` tree instead, and every
//! node of that tree is matched.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use super::{file_label, read_manifest, ManifestScanner};
use crate::checker::{actual_version, VulnerabilityIndex};
use crate::error::ScanError;
use crate::model::Finding;

/// Install-path prefix of top-level packages in the flat map.
const NODE_MODULES_PREFIX: &str = "node_modules/";

/// Marker of a transitively nested install path.
const NESTED_MARKER: &str = "/node_modules/";

/// Deepest v1 dependency nesting that is walked.
const MAX_NESTING_DEPTH: usize = 32;

pub struct PackageLockScanner;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageLock {
    #[serde(default)]
    lockfile_version: u32,
    #[serde(default)]
    packages: IndexMap<String, FlatEntry>,
    #[serde(default)]
    dependencies: IndexMap<String, TreeEntry>,
}

/// Entry of the v2/v3 `packages` map.
#[derive(Deserialize)]
struct FlatEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    resolved: String,
}

/// Node of the v1 `dependencies` tree.
#[derive(Deserialize)]
struct TreeEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    dependencies: IndexMap<String, TreeEntry>,
}

impl ManifestScanner for PackageLockScanner {
    fn name(&self) -> &'static str {
        "package-lock.json"
    }

    fn file_name(&self) -> &'static str {
        "package-lock.json"
    }

    fn scan(&self, path: &Path, index: &VulnerabilityIndex) -> Result<Vec<Finding>, ScanError> {
        let content = read_manifest(path)?;
        let lock: PackageLock =
            serde_json::from_str(&content).map_err(|e| ScanError::parse(path, e))?;

        let label = file_label(path);
        let mut findings = Vec::new();

        if lock.lockfile_version >= 2 && !lock.packages.is_empty() {
            scan_packages(&lock.packages, index, &label, &mut findings);
        } else if !lock.dependencies.is_empty() {
            scan_tree(&lock.dependencies, index, &label, 0, &mut findings);
        }

        Ok(findings)
    }
}

fn scan_packages(
    packages: &IndexMap<String, FlatEntry>,
    index: &VulnerabilityIndex,
    label: &str,
    findings: &mut Vec<Finding>,
) {
    for (install_path, entry) in packages {
        let name = install_path
            .strip_prefix(NODE_MODULES_PREFIX)
            .unwrap_or(install_path);
        // "" is the root project; nested paths are transitive copies
        if name.is_empty() || name.contains(NESTED_MARKER) {
            continue;
        }

        let version = actual_version(&entry.version, &entry.resolved);
        if index.lookup(name, &version).is_some() {
            findings.push(Finding::new(name, version, label));
        }
    }
}

fn scan_tree(
    dependencies: &IndexMap<String, TreeEntry>,
    index: &VulnerabilityIndex,
    label: &str,
    depth: usize,
    findings: &mut Vec<Finding>,
) {
    if depth >= MAX_NESTING_DEPTH {
        warn!(
            file = label,
            max = MAX_NESTING_DEPTH,
            "dependency tree nested too deeply, skipping subtree"
        );
        return;
    }

    for (name, entry) in dependencies {
        if index.lookup(name, &entry.version).is_some() {
            findings.push(Finding::new(name, &entry.version, label));
        }
        if !entry.dependencies.is_empty() {
            scan_tree(&entry.dependencies, index, label, depth + 1, findings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VulnerablePackage;
    use std::fs;

    fn index() -> VulnerabilityIndex {
        VulnerabilityIndex::build(&[
            VulnerablePackage::new("@ctrl/tinycolor", ["4.1.1"]),
            VulnerablePackage::new("lodash", ["4.17.20"]),
        ])
    }

    fn scan(content: &str) -> Result<Vec<Finding>, ScanError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        fs::write(&path, content).unwrap();
        PackageLockScanner.scan(&path, &index())
    }

    #[test]
    fn test_v3_packages() {
        let findings = scan(
            r#"{
              "lockfileVersion": 3,
              "packages": {
                "": { "name": "my-action", "version": "1.0.0" },
                "node_modules/@ctrl/tinycolor": { "version": "4.1.1" },
                "node_modules/lodash": { "version": "4.17.21" }
              }
            }"#,
        )
        .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message(),
            "Found vulnerable package @ctrl/tinycolor with version 4.1.1 in package-lock.json"
        );
    }

    #[test]
    fn test_nested_install_paths_skipped() {
        let findings = scan(
            r#"{
              "lockfileVersion": 3,
              "packages": {
                "node_modules/foo": { "version": "1.0.0" },
                "node_modules/foo/node_modules/@ctrl/tinycolor": { "version": "4.1.1" }
              }
            }"#,
        )
        .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_resolved_url_wins_over_declared_version() {
        let findings = scan(
            r#"{
              "lockfileVersion": 2,
              "packages": {
                "node_modules/@ctrl/tinycolor": {
                  "version": "^4.1.0",
                  "resolved": "https://registry.npmjs.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz",
                  "dependencies": {}
                }
              }
            }"#,
        )
        .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].version.as_deref(), Some("4.1.1"));
    }

    #[test]
    fn test_v1_nested_tree() {
        let findings = scan(
            r#"{
              "lockfileVersion": 1,
              "dependencies": {
                "lodash": {
                  "version": "4.17.20",
                  "dependencies": {
                    "@ctrl/tinycolor": {
                      "version": "4.1.1",
                      "dependencies": {
                        "lodash": { "version": "4.17.20" }
                      }
                    }
                  }
                },
                "safe-package": { "version": "1.0.0" }
              }
            }"#,
        )
        .unwrap();

        let names: Vec<_> = findings.iter().map(|f| f.package.as_str()).collect();
        assert_eq!(names, ["lodash", "@ctrl/tinycolor", "lodash"]);
    }

    #[test]
    fn test_v2_without_packages_falls_back_to_tree() {
        let findings = scan(
            r#"{
              "lockfileVersion": 2,
              "dependencies": { "lodash": { "version": "4.17.20" } }
            }"#,
        )
        .unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_v1_ignores_packages_map() {
        let findings = scan(
            r#"{
              "lockfileVersion": 1,
              "packages": { "node_modules/lodash": { "version": "4.17.20" } }
            }"#,
        )
        .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_invalid_lockfile() {
        assert!(matches!(
            scan(r#"{ "lockfileVersion": "three" }"#).unwrap_err(),
            ScanError::Parse { .. }
        ));
        assert!(matches!(scan("[").unwrap_err(), ScanError::Parse { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut json = String::from(r#"{"version": "4.17.20"}"#);
        for _ in 0..(MAX_NESTING_DEPTH + 5) {
            json = format!(r#"{{"version": "1.0.0", "dependencies": {{"lodash": {}}}}}"#, json);
        }
        let content = format!(r#"{{"lockfileVersion": 1, "dependencies": {{"root": {}}}}}"#, json);

        let findings = scan(&content).unwrap();
        assert!(findings.is_empty());
    }
}

//! `pnpm-lock.yaml` scanner.
//!
//! Two shapes are checked independently, so one package can be reported
//! twice:
//!
//! - the `packages` map, keyed `/name/version`, `/@scope/name/version`, or in
//!   newer lockfiles `name@version`;
//! - the `dependencies`/`devDependencies`/`optionalDependencies` maps at the
//!   top level and under each entry of `importers`.

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::path::Path;

use super::{file_label, read_manifest, ManifestScanner};
use crate::checker::VulnerabilityIndex;
use crate::error::ScanError;
use crate::model::Finding;

pub struct PnpmLockScanner;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PnpmLock {
    #[serde(default)]
    packages: Option<IndexMap<String, IgnoredAny>>,
    #[serde(default)]
    dependencies: Option<IndexMap<String, DependencyRef>>,
    #[serde(default)]
    dev_dependencies: Option<IndexMap<String, DependencyRef>>,
    #[serde(default)]
    optional_dependencies: Option<IndexMap<String, DependencyRef>>,
    #[serde(default)]
    importers: Option<IndexMap<String, Importer>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Importer {
    #[serde(default)]
    dependencies: Option<IndexMap<String, DependencyRef>>,
    #[serde(default)]
    dev_dependencies: Option<IndexMap<String, DependencyRef>>,
    #[serde(default)]
    optional_dependencies: Option<IndexMap<String, DependencyRef>>,
}

/// A dependency map value: `4.17.20` in older lockfiles,
/// `{ specifier: ^4.17.0, version: 4.17.20 }` since lockfile 6.
#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyRef {
    Text(String),
    Detailed { version: String },
    Other(serde_yaml::Value),
}

impl DependencyRef {
    fn version(&self) -> Option<String> {
        match self {
            DependencyRef::Text(version) => Some(version.clone()),
            DependencyRef::Detailed { version } => Some(strip_peer_suffix(version).to_string()),
            // bare numbers such as `1.0` are read as floats by YAML
            DependencyRef::Other(serde_yaml::Value::Number(n)) => Some(n.to_string()),
            DependencyRef::Other(_) => None,
        }
    }
}

impl ManifestScanner for PnpmLockScanner {
    fn name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn file_name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn scan(&self, path: &Path, index: &VulnerabilityIndex) -> Result<Vec<Finding>, ScanError> {
        let content = read_manifest(path)?;
        let lock: PnpmLock =
            serde_yaml::from_str(&content).map_err(|e| ScanError::parse(path, e))?;

        let label = file_label(path);
        let mut findings = Vec::new();

        for key in lock.packages.iter().flat_map(IndexMap::keys) {
            let Some((name, version)) = parse_package_key(key) else {
                continue;
            };
            if index.lookup(name, version).is_some() {
                findings.push(Finding::new(name, version, &label));
            }
        }

        let mut maps = vec![
            &lock.dependencies,
            &lock.dev_dependencies,
            &lock.optional_dependencies,
        ];
        for importer in lock.importers.iter().flat_map(IndexMap::values) {
            maps.push(&importer.dependencies);
            maps.push(&importer.dev_dependencies);
            maps.push(&importer.optional_dependencies);
        }

        for deps in maps.into_iter().flatten() {
            for (name, dep) in deps {
                let Some(version) = dep.version() else {
                    continue;
                };
                if index.lookup(name, &version).is_some() {
                    findings.push(Finding::new(name, version, &label));
                }
            }
        }

        Ok(findings)
    }
}

/// Splits a `packages` key into package name and version.
fn parse_package_key(key: &str) -> Option<(&str, &str)> {
    let key = strip_peer_suffix(key);
    if key.is_empty() || key == "/" {
        return None;
    }
    parse_slash_key(key).or_else(|| parse_at_key(key))
}

/// `/lodash/4.17.20`, `/@ctrl/tinycolor/4.1.1`
fn parse_slash_key(key: &str) -> Option<(&str, &str)> {
    let trimmed = key.strip_prefix('/').unwrap_or(key);
    let parts: Vec<&str> = trimmed.split('/').collect();

    let (name, version) = if trimmed.starts_with('@') {
        if parts.len() < 3 {
            return None;
        }
        // scope and name are adjacent in `trimmed`
        let name_len = parts[0].len() + 1 + parts[1].len();
        (&trimmed[..name_len], parts[2])
    } else {
        if parts.len() < 2 {
            return None;
        }
        (parts[0], parts[1])
    };

    (!name.is_empty() && !version.is_empty()).then_some((name, version))
}

/// `/lodash@4.17.21`, `@ctrl/tinycolor@4.1.1`
fn parse_at_key(key: &str) -> Option<(&str, &str)> {
    let trimmed = key.strip_prefix('/').unwrap_or(key);
    let search_from = usize::from(trimmed.starts_with('@'));
    let at = trimmed[search_from..].find('@')? + search_from;
    let (name, version) = (&trimmed[..at], &trimmed[at + 1..]);

    (!name.is_empty() && !version.is_empty()).then_some((name, version))
}

/// Drops a peer-dependency suffix: `4.1.1(react@18.2.0)` -> `4.1.1`.
fn strip_peer_suffix(text: &str) -> &str {
    text.split_once('(').map_or(text, |(head, _)| head)
}

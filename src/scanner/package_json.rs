use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use super::{file_label, read_manifest, ManifestScanner};
use crate::checker::VulnerabilityIndex;
use crate::error::ScanError;
use crate::model::{DependencyCategory, Finding};

pub struct PackageJsonScanner;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    dependencies: Option<IndexMap<String, String>>,
    dev_dependencies: Option<IndexMap<String, String>>,
    peer_dependencies: Option<IndexMap<String, String>>,
    optional_dependencies: Option<IndexMap<String, String>>,
    #[serde(alias = "bundleDependencies")]
    bundled_dependencies: Option<BundledDependencies>,
}

/// `bundledDependencies` is either a list of names or `true` for "everything".
#[derive(Deserialize)]
#[serde(untagged)]
enum BundledDependencies {
    Names(Vec<String>),
    All(#[allow(dead_code)] bool),
}

impl ManifestScanner for PackageJsonScanner {
    fn name(&self) -> &'static str {
        "package.json"
    }

    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn scan(&self, path: &Path, index: &VulnerabilityIndex) -> Result<Vec<Finding>, ScanError> {
        let content = read_manifest(path)?;
        let manifest: PackageJson =
            serde_json::from_str(&content).map_err(|e| ScanError::parse(path, e))?;

        let label = file_label(path);
        let mut findings = Vec::new();

        let buckets = [
            (&manifest.dependencies, DependencyCategory::Dependencies),
            (&manifest.dev_dependencies, DependencyCategory::DevDependencies),
            (&manifest.peer_dependencies, DependencyCategory::PeerDependencies),
            (&manifest.optional_dependencies, DependencyCategory::OptionalDependencies),
        ];

        for (deps, category) in buckets {
            let Some(deps) = deps else {
                continue;
            };
            for (name, version) in deps {
                if index.lookup(name, version).is_some() {
                    findings.push(Finding::new(name, version, &label).with_category(category));
                }
            }
        }

        // Bundled entries carry no version, so any listed name is reported.
        if let Some(BundledDependencies::Names(names)) = &manifest.bundled_dependencies {
            for name in names {
                if index.contains(name) {
                    findings.push(Finding::bundled(name, &label));
                }
            }
        }

        Ok(findings)
    }
}

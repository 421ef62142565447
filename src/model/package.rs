use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::PackageListError;

/// Vulnerable-package table compiled into the binary.
const BUILTIN_PACKAGES: &str = include_str!("../../data/vulnerable-packages.json");

/// A package known to have been published in compromised versions.
///
/// `versions` may hold exact versions (`4.1.1`), ranges (`>=4.1.1 <4.2.0`)
/// or opaque strings that only ever match verbatim (`latest`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerablePackage {
    pub name: String,
    pub versions: Vec<String>,
}

impl VulnerablePackage {
    pub fn new<I, S>(name: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }
}

/// The list of vulnerable packages a scan matches against.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageList {
    packages: Vec<VulnerablePackage>,
}

impl PackageList {
    pub fn new(packages: Vec<VulnerablePackage>) -> Self {
        Self { packages }
    }

    /// Returns the table shipped with actscan.
    pub fn builtin() -> Result<Self, PackageListError> {
        Self::from_json(BUILTIN_PACKAGES, "<builtin>")
    }

    /// Loads a replacement table from a JSON file.
    ///
    /// The file holds an array of `{"name": ..., "versions": [...]}` objects.
    pub fn load(path: &Path) -> Result<Self, PackageListError> {
        let content = fs::read_to_string(path).map_err(|source| PackageListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, &path.display().to_string())
    }

    fn from_json(json: &str, origin: &str) -> Result<Self, PackageListError> {
        serde_json::from_str(json).map_err(|source| PackageListError::Parse {
            origin: origin.to_owned(),
            source,
        })
    }

    pub fn packages(&self) -> &[VulnerablePackage] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

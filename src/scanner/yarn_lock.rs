//! `yarn.lock` scanner.
//!
//! yarn.lock is neither JSON nor YAML, so it is read line by line. An
//! unindented line ending in `:` opens a block for one or more specifiers of
//! the same package; the indented `version` line inside the block names the
//! locked version:
//!
//! ```text
//! "@ctrl/tinycolor@^4.1.0", "@ctrl/tinycolor@^4.1.1":
//!   version "4.1.1"
//!   resolved "https://registry.yarnpkg.com/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz"
//! ```

use std::path::Path;

use super::{file_label, read_manifest, ManifestScanner};
use crate::checker::VulnerabilityIndex;
use crate::error::ScanError;
use crate::model::Finding;

const VERSION_KEY: &str = "version";

pub struct YarnLockScanner;

impl ManifestScanner for YarnLockScanner {
    fn name(&self) -> &'static str {
        "yarn.lock"
    }

    fn file_name(&self) -> &'static str {
        "yarn.lock"
    }

    fn scan(&self, path: &Path, index: &VulnerabilityIndex) -> Result<Vec<Finding>, ScanError> {
        let content = read_manifest(path)?;
        Ok(scan_lines(&content, index, &file_label(path)))
    }
}

fn scan_lines(content: &str, index: &VulnerabilityIndex, label: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut current_package = String::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !raw.starts_with(' ') && line.ends_with(':') {
            let header = line.trim_end_matches(':');
            if let Some(name) = header
                .split(',')
                .map(|spec| package_name_from_spec(unquote(spec.trim())))
                .find(|name| !name.is_empty())
            {
                current_package = name.to_string();
            }
        } else if raw.starts_with("  ") && line.contains(VERSION_KEY) {
            let Some((_, rest)) = line.split_once(VERSION_KEY) else {
                continue;
            };
            // Yarn Berry writes `version: 4.1.1`
            let rest = rest.trim();
            let version = unquote(rest.strip_prefix(':').unwrap_or(rest).trim());

            if index.lookup(&current_package, version).is_some() {
                findings.push(Finding::new(&current_package, version, label));
            }
        }
    }

    findings
}

/// Extracts the package name from a specifier such as `@ctrl/tinycolor@^4.1.0`.
///
/// For scoped names the version separator is the first `@` after the `/`.
/// A specifier without a version is returned whole.
fn package_name_from_spec(spec: &str) -> &str {
    let spec = spec.trim();

    if spec.starts_with('@') {
        let Some(slash) = spec.find('/') else {
            return "";
        };
        match spec[slash..].find('@') {
            Some(at) => &spec[..slash + at],
            None => spec,
        }
    } else {
        match spec.find('@') {
            Some(at) => &spec[..at],
            None => spec,
        }
    }
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

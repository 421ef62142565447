//! Manifest and lockfile scanners.
//!
//! This module provides the [`ManifestScanner`] trait and one implementation
//! per npm dependency file found in action repositories.
//!
//! # Available Scanners
//!
//! | Scanner | File | Shape |
//! |---------|------|-------|
//! | [`PackageJsonScanner`] | `package.json` | Declared ranges per dependency category |
//! | [`PackageLockScanner`] | `package-lock.json` | Flat `packages` map (v2/v3) or nested `dependencies` tree (v1) |
//! | [`YarnLockScanner`] | `yarn.lock` | Line-oriented blocks under multi-spec headers |
//! | [`PnpmLockScanner`] | `pnpm-lock.yaml` | Path-keyed `packages` plus dependency maps |
//!
//! # Example
//!
//! ```no_run
//! use actscan::scanner::scan_action_dir;
//! use actscan::{VulnerabilityIndex, VulnerablePackage};
//! use std::path::Path;
//!
//! let index = VulnerabilityIndex::build(&[VulnerablePackage::new("chalk", ["5.6.1"])]);
//! let scan = scan_action_dir(Path::new("/tmp/action"), &index);
//! for finding in &scan.findings {
//!     println!("{}", finding);
//! }
//! ```

mod package_json;
mod package_lock;
mod pnpm_lock;
mod yarn_lock;

pub use package_json::PackageJsonScanner;
pub use package_lock::PackageLockScanner;
pub use pnpm_lock::PnpmLockScanner;
pub use yarn_lock::YarnLockScanner;

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::checker::VulnerabilityIndex;
use crate::error::ScanError;
use crate::model::Finding;

/// Trait for scanning one kind of dependency file.
///
/// Implementations are stateless; the same scanner can be run against any
/// number of directories, concurrently if needed.
pub trait ManifestScanner: Send + Sync {
    /// Returns the human-readable name of this scanner.
    fn name(&self) -> &'static str;

    /// Returns the file name this scanner looks for in an action directory.
    fn file_name(&self) -> &'static str;

    /// Scans the file at `path` and returns every vulnerable dependency in
    /// file order.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Read`] if the file cannot be read and
    /// [`ScanError::Parse`] if its content does not match the format.
    /// No findings are returned alongside an error.
    fn scan(&self, path: &Path, index: &VulnerabilityIndex) -> Result<Vec<Finding>, ScanError>;
}

/// Returns all scanners in the order their findings are reported.
///
/// # Example
///
/// ```
/// use actscan::scanner::all_scanners;
///
/// let names: Vec<_> = all_scanners().iter().map(|s| s.file_name()).collect();
/// assert_eq!(names, ["package.json", "package-lock.json", "yarn.lock", "pnpm-lock.yaml"]);
/// ```
pub fn all_scanners() -> Vec<Box<dyn ManifestScanner>> {
    vec![
        Box::new(PackageJsonScanner),
        Box::new(PackageLockScanner),
        Box::new(YarnLockScanner),
        Box::new(PnpmLockScanner),
    ]
}

/// Findings and per-file failures from scanning one action directory.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub findings: Vec<Finding>,
    pub errors: Vec<ScanError>,
}

/// Runs every scanner whose file is present in `dir`.
///
/// Missing files are skipped. A file that fails to read or parse contributes
/// an entry to [`DirectoryScan::errors`] and no findings; the remaining
/// scanners still run.
pub fn scan_action_dir(dir: &Path, index: &VulnerabilityIndex) -> DirectoryScan {
    let mut result = DirectoryScan::default();

    for scanner in all_scanners() {
        let path = dir.join(scanner.file_name());
        if !path.exists() {
            debug!(file = scanner.file_name(), "not found, skipping");
            continue;
        }

        debug!(path = %path.display(), scanner = scanner.name(), "scanning");
        match scanner.scan(&path, index) {
            Ok(findings) => {
                debug!(path = %path.display(), findings = findings.len(), "scan complete");
                result.findings.extend(findings);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to scan, skipping");
                result.errors.push(e);
            }
        }
    }

    result
}

/// Reads a dependency file as UTF-8 text.
///
/// I/O failures map to [`ScanError::Read`]; content that is not UTF-8 is a
/// [`ScanError::Parse`].
fn read_manifest(path: &Path) -> Result<String, ScanError> {
    let bytes = fs::read(path).map_err(|e| ScanError::read(path, e))?;
    String::from_utf8(bytes).map_err(|e| ScanError::parse(path, e))
}

/// Base file name used in finding messages.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

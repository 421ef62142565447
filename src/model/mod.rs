//! Core data types for vulnerable packages, findings, and scan results.
//!
//! This module contains the fundamental types used throughout actscan:
//!
//! - [`VulnerablePackage`] - A package name and its known-compromised versions
//! - [`PackageList`] - The table of vulnerable packages a scan matches against
//! - [`DependencyCategory`] - The `package.json` bucket a dependency came from
//! - [`Finding`] - A vulnerable dependency discovered in a manifest
//! - [`ActionRef`] - A third-party action referenced by a workflow
//! - [`ScanResult`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use actscan::{Finding, DependencyCategory};
//!
//! let finding = Finding::new("@ctrl/tinycolor", "4.1.1", "package.json")
//!     .with_category(DependencyCategory::Dependencies);
//!
//! assert_eq!(
//!     finding.to_string(),
//!     "Found vulnerable package @ctrl/tinycolor with version 4.1.1 in package.json (dependencies)"
//! );
//! ```

mod action;
mod finding;
mod package;
mod report;

pub use action::*;
pub use finding::*;
pub use package::*;
pub use report::*;

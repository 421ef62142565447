//! Version matching against the vulnerable-package table.
//!
//! - [`is_vulnerable`] decides whether one version specifier hits a list of
//!   vulnerable versions.
//! - [`actual_version`] picks the concrete version out of a resolved tarball
//!   URL when a lockfile records one.
//! - [`VulnerabilityIndex`] answers "is this (name, version) vulnerable" for
//!   all manifest scanners.

mod index;
mod resolved;
mod version;

pub use index::VulnerabilityIndex;
pub use resolved::{actual_version, version_from_resolved};
pub use version::{clean_version, is_range_specifier, is_vulnerable, parse_version, Range};

//! Scan the npm dependencies of GitHub Actions for compromised package
//! versions.
//!
//! A workflow's `uses:` references are resolved to repositories, each
//! repository is fetched at the referenced version, and its `package.json`,
//! `package-lock.json`, `yarn.lock` and `pnpm-lock.yaml` are matched against
//! a [`VulnerabilityIndex`].

pub mod audit;
pub mod checker;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod scanner;
pub mod workflow;

pub use audit::Auditor;
pub use checker::VulnerabilityIndex;
pub use config::Config;
pub use error::{FetchError, PackageListError, ScanError};
pub use model::{
    ActionRef, ActionReport, DependencyCategory, Finding, PackageList, ScanResult,
    VulnerablePackage, WorkflowReport,
};

//! GitHub Actions workflow discovery and parsing.
//!
//! Only the `uses:` keys of job steps matter here; everything else in a
//! workflow file is ignored.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::ActionRef;

/// A parsed workflow file.
#[derive(Debug, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    jobs: IndexMap<String, Job>,
}

#[derive(Debug, Default, Deserialize)]
struct Job {
    // reusable workflow calls have `uses` on the job and no steps
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
struct Step {
    #[serde(default)]
    uses: Option<String>,
}

impl Workflow {
    /// Parses workflow YAML.
    pub fn parse(content: &str) -> Result<Self> {
        // an empty document deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse workflow YAML")
    }

    /// Reads and parses the workflow file at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid workflow {}", path.display()))
    }

    /// Every remote action referenced by a step, in job and step order.
    ///
    /// Local (`./...`) and `docker://` references are left out.
    pub fn actions(&self) -> Vec<ActionRef> {
        self.jobs
            .iter()
            .flat_map(|(job_id, job)| {
                job.steps.iter().filter_map(move |step| {
                    let uses = step.uses.as_deref()?;
                    let action = ActionRef::parse(uses);
                    if action.is_none() {
                        debug!(job = %job_id, uses, "skipping non-remote action");
                    }
                    action
                })
            })
            .collect()
    }
}

/// Resolves the workflow files to scan.
///
/// A file path is returned as-is. A directory yields its direct `.yml` and
/// `.yaml` children in sorted order.
pub fn discover_workflows(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read workflow directory {}", path.display()))?;

    let mut workflows = Vec::new();
    for entry in entries {
        let entry_path = entry?.path();
        let is_yaml = entry_path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml && entry_path.is_file() {
            workflows.push(entry_path);
        }
    }
    workflows.sort();

    debug!(path = %path.display(), count = workflows.len(), "discovered workflows");
    Ok(workflows)
}

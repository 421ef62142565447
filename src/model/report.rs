use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::{ActionRef, Finding};

/// Outcome of fetching and scanning one action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action: ActionRef,
    pub findings: Vec<Finding>,
    /// Manifest files that could not be read or parsed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Set when the action's repository could not be retrieved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl ActionReport {
    pub fn new(action: ActionRef) -> Self {
        Self {
            action,
            findings: Vec::new(),
            errors: Vec::new(),
            fetch_error: None,
        }
    }

    pub fn fetch_failed(action: ActionRef, error: impl ToString) -> Self {
        Self {
            fetch_error: Some(error.to_string()),
            ..Self::new(action)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.errors.is_empty() && self.fetch_error.is_none()
    }
}

/// All actions scanned for one workflow file.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub path: PathBuf,
    pub actions: Vec<ActionReport>,
    /// Set when the workflow itself could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            actions: Vec::new(),
            error: None,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.actions.iter().map(|a| a.findings.len()).sum()
    }
}

/// Complete results of one `actscan scan` run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub scan_time: DateTime<Utc>,
    pub workflows: Vec<WorkflowReport>,
}

impl ScanResult {
    pub fn new(workflows: Vec<WorkflowReport>) -> Self {
        Self {
            scan_time: Utc::now(),
            workflows,
        }
    }

    pub fn action_count(&self) -> usize {
        self.workflows.iter().map(|w| w.actions.len()).sum()
    }

    pub fn finding_count(&self) -> usize {
        self.workflows.iter().map(WorkflowReport::finding_count).sum()
    }

    pub fn has_findings(&self) -> bool {
        self.finding_count() > 0
    }
}

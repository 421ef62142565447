//! Workflow auditing: fetch every referenced action and scan its manifests.

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::checker::VulnerabilityIndex;
use crate::config::Config;
use crate::fetch::ActionFetcher;
use crate::model::{ActionRef, ActionReport, ScanResult, WorkflowReport};
use crate::scanner::scan_action_dir;
use crate::workflow::Workflow;

/// Audits workflows against a shared vulnerability index.
///
/// Failures are recorded in the returned reports rather than propagated, so
/// one unreachable action or malformed workflow never stops the others.
///
/// # Example
///
/// ```no_run
/// use actscan::fetch::GitFetcher;
/// use actscan::{Auditor, Config, PackageList, VulnerabilityIndex};
/// use std::path::Path;
///
/// # async fn run() -> anyhow::Result<()> {
/// let index = VulnerabilityIndex::from_list(&PackageList::builtin()?);
/// let auditor = Auditor::new(index, GitFetcher::new(), Config::default());
/// let report = auditor.audit_workflow(Path::new(".github/workflows/ci.yml")).await;
/// println!("{} findings", report.finding_count());
/// # Ok(())
/// # }
/// ```
pub struct Auditor {
    index: Arc<VulnerabilityIndex>,
    fetcher: Arc<dyn ActionFetcher>,
    config: Config,
}

impl Auditor {
    pub fn new(
        index: VulnerabilityIndex,
        fetcher: impl ActionFetcher + 'static,
        config: Config,
    ) -> Self {
        Self {
            index: Arc::new(index),
            fetcher: Arc::new(fetcher),
            config,
        }
    }

    /// Audits each workflow in turn.
    pub async fn audit(&self, workflows: &[impl AsRef<Path>]) -> ScanResult {
        let mut reports = Vec::with_capacity(workflows.len());
        for path in workflows {
            reports.push(self.audit_workflow(path.as_ref()).await);
        }
        ScanResult::new(reports)
    }

    /// Parses the workflow at `path` and audits its actions.
    ///
    /// Actions run concurrently when [`Config::parallel`] is set; reports are
    /// returned in workflow order either way.
    pub async fn audit_workflow(&self, path: &Path) -> WorkflowReport {
        let mut report = WorkflowReport::new(path.to_path_buf());

        let workflow = match Workflow::from_path(path) {
            Ok(workflow) => workflow,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "skipping workflow");
                report.error = Some(format!("{:#}", e));
                return report;
            }
        };

        let actions: Vec<ActionRef> = workflow
            .actions()
            .into_iter()
            .filter(|action| {
                let ignored = self.config.ignore.should_ignore_action(&action.slug());
                if ignored {
                    debug!(action = %action, "ignored by config");
                }
                !ignored
            })
            .collect();

        info!(path = %path.display(), actions = actions.len(), "auditing workflow");

        report.actions = if self.config.parallel {
            join_all(actions.into_iter().map(|action| self.audit_action(action))).await
        } else {
            let mut reports = Vec::with_capacity(actions.len());
            for action in actions {
                reports.push(self.audit_action(action).await);
            }
            reports
        };

        report
    }

    /// Fetches one action into a scratch directory and scans it.
    ///
    /// The scratch directory is removed when this returns.
    pub async fn audit_action(&self, action: ActionRef) -> ActionReport {
        let scratch = match tempfile::Builder::new().prefix("actscan-").tempdir() {
            Ok(dir) => dir,
            Err(e) => return ActionReport::fetch_failed(action, e),
        };

        debug!(action = %action, dest = %scratch.path().display(), "fetching");
        if let Err(e) = self.fetcher.fetch(&action, scratch.path()).await {
            warn!(action = %action, error = %e, "failed to fetch action");
            return ActionReport::fetch_failed(action, e);
        }

        let index = Arc::clone(&self.index);
        let dir = scratch.path().to_path_buf();
        let scan = tokio::task::spawn_blocking(move || scan_action_dir(&dir, &index)).await;

        let mut report = ActionReport::new(action);
        match scan {
            Ok(scan) => {
                report.findings = scan.findings;
                report.errors = scan.errors.iter().map(ToString::to_string).collect();
            }
            Err(e) => report.errors.push(format!("scan task failed: {}", e)),
        }

        info!(
            action = %report.action,
            findings = report.findings.len(),
            errors = report.errors.len(),
            "scanned action"
        );
        report
    }
}

//! Workflow audits against local action fixtures; no network access.

use actscan::fetch::{ActionFetcher, GitFetcher};
use actscan::model::ActionRef;
use actscan::workflow::discover_workflows;
use actscan::{Auditor, Config, FetchError, PackageList, VulnerabilityIndex};
use std::path::PathBuf;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn auditor() -> Auditor {
    let index = VulnerabilityIndex::from_list(&PackageList::builtin().unwrap());
    let fetcher = GitFetcher::new().with_fixtures(fixtures().join("actions"));
    Auditor::new(index, fetcher, Config::default())
}

#[tokio::test]
async fn fixture_action_findings() {
    let workflows = discover_workflows(&fixtures().join("workflows")).unwrap();
    assert_eq!(workflows.len(), 1);

    let result = auditor().audit(&workflows).await;
    assert_eq!(result.action_count(), 1);

    let report = &result.workflows[0].actions[0];
    assert_eq!(report.action.to_string(), "some-user/some-action-with-vulnerable-dep@v1");
    assert!(report.fetch_error.is_none());

    let messages: Vec<String> = report.findings.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        [
            "Found vulnerable package @ctrl/tinycolor with version 4.1.1 in package.json (dependencies)",
            "Found vulnerable package @ctrl/tinycolor with version 4.1.1 in package-lock.json",
        ]
    );
}

#[tokio::test]
async fn ignored_action_is_skipped() {
    let index = VulnerabilityIndex::from_list(&PackageList::builtin().unwrap());
    let fetcher = GitFetcher::new().with_fixtures(fixtures().join("actions"));
    let mut config = Config::default();
    config.ignore.actions = vec!["some-user/*".to_string()];

    let auditor = Auditor::new(index, fetcher, config);
    let report = auditor
        .audit_workflow(&fixtures().join("workflows").join("ci.yml"))
        .await;
    assert!(report.actions.is_empty());
    assert!(report.error.is_none());
}

#[tokio::test]
async fn fixture_copy_matches_source_tree() {
    let dest = tempfile::tempdir().unwrap();
    let action = ActionRef::parse("some-user/some-action-with-vulnerable-dep@v1").unwrap();

    let fetcher = GitFetcher::new().with_fixtures(fixtures().join("actions"));
    let outcome: Result<(), FetchError> = fetcher.fetch(&action, dest.path()).await;
    outcome.unwrap();

    assert!(dest.path().join("package.json").is_file());
    assert!(dest.path().join("package-lock.json").is_file());
}

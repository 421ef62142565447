use crate::model::{ActionReport, ScanResult, WorkflowReport};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Problem")]
    problem: String,
}

pub fn print_cli_table(result: &ScanResult) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        result.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if result.workflows.is_empty() {
        println!();
        println!("No workflow files found.");
    }

    for workflow in &result.workflows {
        print_workflow(workflow);
    }

    println!();
    print_summary(result);

    Ok(())
}

fn print_workflow(workflow: &WorkflowReport) {
    println!();
    println!("Workflow: {}", workflow.path.display());

    if let Some(error) = &workflow.error {
        println!("  \x1b[31mError:\x1b[0m {}", error);
        return;
    }
    if workflow.actions.is_empty() {
        println!("  No third-party actions.");
        return;
    }

    let rows = finding_rows(&workflow.actions);
    if rows.is_empty() {
        println!(
            "  \x1b[32mNo vulnerable packages in {} actions.\x1b[0m",
            workflow.actions.len()
        );
    } else {
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    let problems = problem_rows(&workflow.actions);
    if !problems.is_empty() {
        println!();
        println!("Could not fully scan {} actions:", problems.len());
        let table = Table::new(problems).with(Style::rounded()).to_string();
        println!("{}", table);
    }
}

fn finding_rows(actions: &[ActionReport]) -> Vec<FindingRow> {
    actions
        .iter()
        .flat_map(|report| {
            report.findings.iter().map(move |finding| FindingRow {
                action: truncate(&report.action.to_string(), 40),
                package: finding.package.clone(),
                version: finding
                    .version
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                file: finding.file.clone(),
                category: finding
                    .category
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect()
}

fn problem_rows(actions: &[ActionReport]) -> Vec<ProblemRow> {
    let mut rows = Vec::new();
    for report in actions {
        let problems = report.fetch_error.iter().chain(&report.errors);
        for problem in problems {
            rows.push(ProblemRow {
                action: truncate(&report.action.to_string(), 40),
                problem: truncate(problem, 80),
            });
        }
    }
    rows
}

fn print_summary(result: &ScanResult) {
    let findings = result.finding_count();
    let summary = format!(
        "Scanned {} actions in {} workflows: {} vulnerable packages",
        result.action_count(),
        result.workflows.len(),
        findings
    );

    if findings > 0 {
        println!("\x1b[31m{}\x1b[0m", summary);
    } else {
        println!("\x1b[32m{}\x1b[0m", summary);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionRef, DependencyCategory, Finding};

    fn report() -> ActionReport {
        let mut report = ActionReport::new(ActionRef::parse("some-user/some-action@v1").unwrap());
        report.findings.push(
            Finding::new("chalk", "5.6.1", "package.json")
                .with_category(DependencyCategory::Dependencies),
        );
        report.findings.push(Finding::bundled("debug", "package.json"));
        report.errors.push("failed to parse yarn.lock: bad".to_string());
        report
    }

    #[test]
    fn test_finding_rows() {
        let rows = finding_rows(&[report()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, "some-user/some-action@v1");
        assert_eq!(rows[0].category, "dependencies");
        assert_eq!(rows[1].version, "unknown");
        assert_eq!(rows[1].category, "bundledDependencies");
    }

    #[test]
    fn test_problem_rows() {
        let failed = ActionReport::fetch_failed(
            ActionRef::parse("gone/away@v9").unwrap(),
            "reference not found",
        );
        let rows = problem_rows(&[report(), failed]);
        let problems: Vec<_> = rows.iter().map(|r| r.problem.as_str()).collect();
        assert_eq!(problems, ["failed to parse yarn.lock: bad", "reference not found"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-action-name", 10), "a-very-...");
    }
}

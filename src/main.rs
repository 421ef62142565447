use actscan::{
    config::Config,
    fetch::GitFetcher,
    model::{PackageList, ScanResult, WorkflowReport},
    output::{format_result_to_string, print_result, OutputFormat},
    workflow::discover_workflows,
    Auditor, VulnerabilityIndex,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const FINDINGS: u8 = 2;
}

#[derive(Parser)]
#[command(name = "actscan")]
#[command(
    author,
    version,
    about = "Scan the dependencies of GitHub Actions for compromised package versions"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a workflow file or a directory of workflows
    Scan {
        /// Workflow file or directory (e.g. .github/workflows)
        path: PathBuf,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// JSON file of vulnerable packages to use instead of the built-in list
        #[arg(short, long)]
        packages: Option<PathBuf>,

        /// Write JSON results to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch and scan actions one at a time
        #[arg(long)]
        no_parallel: bool,

        /// Exit with code 2 if any vulnerable package is found
        #[arg(long)]
        fail_on_findings: bool,
    },

    /// List the vulnerable packages that are checked
    ListPackages {
        /// JSON file of vulnerable packages to use instead of the built-in list
        #[arg(short, long)]
        packages: Option<PathBuf>,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::Scan {
            path,
            format,
            packages,
            output,
            no_parallel,
            fail_on_findings,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;
            if packages.is_some() {
                config.packages_file = packages;
            }
            if no_parallel {
                config.parallel = false;
            }

            let result = run_scan(&path, format, output, config).await?;

            if fail_on_findings && result.has_findings() {
                Ok(exit_codes::FINDINGS)
            } else {
                Ok(exit_codes::SUCCESS)
            }
        }
        Commands::ListPackages { packages } => {
            let packages = packages.or(config.packages_file);
            list_packages(&load_packages(packages.as_deref())?);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    path: &Path,
    format: OutputFormat,
    output_file: Option<PathBuf>,
    config: Config,
) -> Result<ScanResult> {
    let is_interactive = format == OutputFormat::Table;

    let list = load_packages(config.packages_file.as_deref())?;
    let index = VulnerabilityIndex::from_list(&list);
    info!(packages = index.len(), "loaded vulnerable package list");

    let workflows = discover_workflows(path)?;

    let mut fetcher = GitFetcher::new();
    if let Some(dir) = &config.fixtures_dir {
        fetcher = fetcher.with_fixtures(dir);
    }
    let auditor = Auditor::new(index, fetcher, config);

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut reports: Vec<WorkflowReport> = Vec::with_capacity(workflows.len());
    for workflow in &workflows {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Scanning {}...", workflow.display()));
        }
        reports.push(auditor.audit_workflow(workflow).await);
    }

    let result = ScanResult::new(reports);

    if let Some(pb) = progress {
        pb.finish_with_message(format!(
            "Scanned {} actions in {} workflows",
            result.action_count(),
            result.workflows.len()
        ));
    }

    if let Some(path) = output_file {
        let json = format_result_to_string(&result)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if is_interactive {
            println!("Results written to: {}", path.display());
        }
    } else {
        print_result(&result, format)?;
    }

    Ok(result)
}

fn load_packages(path: Option<&Path>) -> Result<PackageList> {
    let list = match path {
        Some(path) => PackageList::load(path)?,
        None => PackageList::builtin()?,
    };
    Ok(list)
}

fn list_packages(list: &PackageList) {
    println!("Vulnerable packages ({}):", list.len());
    println!();

    for package in list.packages() {
        println!("  {:<40} {}", package.name, package.versions.join(", "));
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'actscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

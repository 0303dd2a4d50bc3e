//! Shipline - deploy a static site by committing and pushing it
//!
//! ## Commands
//!
//! - `deploy`: verify, inspect, stage, commit, push, then write the report
//! - `verify`: run the read-only checks a deployment starts with

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use shipline_core::{DeploymentConfig, GitCli, LogFormat, WorkTreeLock, CONFIG_FILE_NAME};
use shipline_pipeline::{DeployPipeline, ReportStatus};

#[derive(Parser)]
#[command(name = "shipline")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fail-fast deployment pipeline for static sites", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Repository working directory
    #[arg(short = 'C', long, global = true, env = "SHIPLINE_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Config file (default: <workdir>/shipline.toml)
    #[arg(short, long, global = true, env = "SHIPLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage, commit and push the site, then write the deployment report
    Deploy(DeployArgs),

    /// Check required files and repository identity without changing anything
    Verify,
}

#[derive(clap::Args, Debug, Default)]
struct DeployArgs {
    /// Commit message (default: "Deploy: <timestamp>")
    #[arg(short, long)]
    message: Option<String>,

    /// Branch to publish
    #[arg(short, long)]
    branch: Option<String>,

    /// Remote to publish to
    #[arg(short, long)]
    remote: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    shipline_core::init_tracing(LogFormat::from_json_flag(cli.json), level);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the command succeeded.
async fn run(cli: Cli) -> Result<bool> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.workdir.join(CONFIG_FILE_NAME));
    let config = DeploymentConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Deploy(args) => {
            let config = apply_overrides(config, &args)?;
            cmd_deploy(&cli.workdir, &config).await
        }
        Commands::Verify => cmd_verify(&cli.workdir, &config).await,
    }
}

fn apply_overrides(mut config: DeploymentConfig, args: &DeployArgs) -> Result<DeploymentConfig> {
    if let Some(message) = &args.message {
        config.commit_message = Some(message.clone());
    }
    if let Some(branch) = &args.branch {
        config.branch = branch.clone();
    }
    if let Some(remote) = &args.remote {
        config.remote = remote.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.command_timeout_secs = secs;
    }
    config.validate().context("invalid command-line override")?;
    Ok(config)
}

/// Run the full pipeline under the work-tree lock
async fn cmd_deploy(workdir: &Path, config: &DeploymentConfig) -> Result<bool> {
    let _lock = WorkTreeLock::acquire(&workdir.join(&config.lock_path))?;

    println!("Deploying {} to {}/{}", workdir.display(), config.remote, config.branch);
    println!();

    let git = GitCli::new(workdir, config.command_timeout());
    let result = DeployPipeline::run(&git, config, workdir)
        .await
        .context("deployment report could not be written")?;
    let report = &result.report;

    println!();
    println!("Run ID: {}", report.run_id);
    println!(
        "Status: {}",
        match report.status {
            ReportStatus::Success => "✓ SUCCESS",
            ReportStatus::Failed => "✗ FAILED",
        }
    );
    if let Some(stage) = report.failed_stage {
        println!("Aborted at: {stage}");
    }
    println!("Duration: {}ms", result.duration_ms);

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for err in &report.errors {
            println!("  ✗ {err}");
        }
    }
    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  ! {warning}");
        }
    }
    println!("\nNext steps:");
    for step in &report.next_steps {
        println!("  - {step}");
    }
    println!("\nReport: {}", result.report_path.display());

    info!(status = ?report.status, "done");
    Ok(report.is_success())
}

/// Report what a deployment would find, without staging or writing anything
async fn cmd_verify(workdir: &Path, config: &DeploymentConfig) -> Result<bool> {
    let git = GitCli::new(workdir, config.command_timeout());
    let preflight = DeployPipeline::preflight(&git, config, workdir).await;

    println!("Required files:");
    for path in preflight.required.present() {
        println!("  ✓ {path}");
    }
    for path in preflight.required.missing() {
        println!("  ✗ {path} (missing)");
    }

    if !config.forced_files.is_empty() {
        println!("\nForced files:");
        for path in &config.forced_files {
            if preflight.forced.missing().contains(path) {
                println!("  ! {path} (missing, would be skipped)");
            } else {
                println!("  ✓ {path}");
            }
        }
    }

    println!("\nRepository:");
    match &preflight.repository {
        Ok(status) => {
            let mark = if status.is_expected_repository { "✓" } else { "✗" };
            println!("  {mark} {} = {}", config.remote, status.remote_url);
            println!("  branch: {}", status.current_branch);
            println!("  changed paths: {}", status.changed_paths.len());
        }
        Err(e) => println!("  ✗ {e}"),
    }

    let ready = preflight.ready();
    println!(
        "\n{}",
        if ready {
            "✓ Ready to deploy"
        } else {
            "✗ Not ready to deploy"
        }
    );
    Ok(ready)
}

//! End-to-end runs against real git repositories in temp directories.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use shipline_core::{CommitOutcome, DeploymentConfig, GitCli, WorkTreeLock};
use shipline_pipeline::{DeployPipeline, ReportStatus, Stage};

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working tree on `main` with `origin` pointing at a local bare repo
/// named `site.git`.
struct Fixture {
    _root: tempfile::TempDir,
    work: std::path::PathBuf,
    remote: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let remote = root.path().join("site.git");
    let work = root.path().join("work");
    std::fs::create_dir_all(&remote).unwrap();
    std::fs::create_dir_all(&work).unwrap();

    run_git(&remote, &["init", "-q", "--bare"]);
    run_git(&work, &["init", "-q"]);
    run_git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    run_git(&work, &["config", "user.name", "test-user"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);
    run_git(&work, &["config", "commit.gpgsign", "false"]);
    run_git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);

    Fixture {
        _root: root,
        work,
        remote,
    }
}

fn config() -> DeploymentConfig {
    let mut config = DeploymentConfig::new("site.git");
    config.required_files = vec!["index.html".to_string()];
    config.forced_files = vec!["dist/bundle.js".to_string()];
    config.commit_message = Some("Deploy site".to_string());
    config
}

#[tokio::test]
async fn deploys_ignored_bundle_to_bare_remote() {
    let fx = fixture();
    std::fs::write(fx.work.join(".gitignore"), "dist/\n").unwrap();
    std::fs::write(fx.work.join("index.html"), "<html></html>").unwrap();
    std::fs::create_dir_all(fx.work.join("dist")).unwrap();
    std::fs::write(fx.work.join("dist/bundle.js"), "console.log('hi')").unwrap();

    let git = GitCli::new(&fx.work, Duration::from_secs(30));
    let result = DeployPipeline::run(&git, &config(), &fx.work)
        .await
        .expect("pipeline failed");

    assert_eq!(result.report.status, ReportStatus::Success, "{:?}", result.report);
    assert!(matches!(result.commit, Some(CommitOutcome::Created { .. })));

    let files = run_git(&fx.remote, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("index.html"));
    assert!(files.contains("dist/bundle.js"));
    let subject = run_git(&fx.remote, &["log", "-1", "--format=%s", "main"]);
    assert_eq!(subject, "Deploy site");
}

#[tokio::test]
async fn second_run_with_nothing_new_is_noop_success() {
    let fx = fixture();
    std::fs::write(fx.work.join("index.html"), "<html></html>").unwrap();
    let mut config = config();
    config.forced_files.clear();

    let git = GitCli::new(&fx.work, Duration::from_secs(30));
    let first = DeployPipeline::run(&git, &config, &fx.work).await.unwrap();
    assert!(first.report.is_success());

    let second = DeployPipeline::run(&git, &config, &fx.work).await.unwrap();
    assert!(second.report.is_success(), "{:?}", second.report);
    assert_eq!(second.commit, Some(CommitOutcome::NothingToCommit));
}

#[tokio::test]
async fn wrong_remote_leaves_index_untouched() {
    let fx = fixture();
    std::fs::write(fx.work.join("index.html"), "<html></html>").unwrap();
    let mut config = config();
    config.repository_identifier = "acme/other-site".to_string();

    let git = GitCli::new(&fx.work, Duration::from_secs(30));
    let result = DeployPipeline::run(&git, &config, &fx.work).await.unwrap();

    assert_eq!(result.report.failed_stage, Some(Stage::Inspect));
    let staged = run_git(&fx.work, &["diff", "--cached", "--name-only"]);
    assert!(staged.is_empty(), "nothing may be staged: {staged}");
}

#[tokio::test]
async fn locked_runs_never_publish_report_or_lock() {
    let fx = fixture();
    std::fs::write(fx.work.join("index.html"), "<html></html>").unwrap();
    let mut config = config();
    config.forced_files.clear();
    let git = GitCli::new(&fx.work, Duration::from_secs(30));

    let first = {
        let _lock = WorkTreeLock::acquire(&fx.work.join(&config.lock_path)).unwrap();
        DeployPipeline::run(&git, &config, &fx.work).await.unwrap()
    };
    assert!(first.report.is_success(), "{:?}", first.report);
    assert!(matches!(first.commit, Some(CommitOutcome::Created { .. })));

    let second = {
        let _lock = WorkTreeLock::acquire(&fx.work.join(&config.lock_path)).unwrap();
        DeployPipeline::run(&git, &config, &fx.work).await.unwrap()
    };
    assert!(second.report.is_success(), "{:?}", second.report);
    assert_eq!(second.commit, Some(CommitOutcome::NothingToCommit));

    let files = run_git(&fx.remote, &["ls-tree", "-r", "--name-only", "main"]);
    assert_eq!(files, "index.html");
    let commits = run_git(&fx.remote, &["rev-list", "--count", "main"]);
    assert_eq!(commits, "1");
}

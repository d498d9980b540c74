//! Preflight against real local repositories (spec section 4.3, invariant
//! that preflight must catch an unreachable destination before any mutation
//! happens).

use std::process::Command;

use gitmux::config::{FilterBackendChoice, RawRunConfig, RebaseOptions, RunConfig};
use gitmux::diagnostics::LogLevel;
use gitmux::preflight;
use tempfile::TempDir;

fn init_bare_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let status = Command::new("git")
        .args(["init", "-q", "--bare"])
        .current_dir(dir.path())
        .status()
        .unwrap();
    assert!(status.success());
    dir
}

fn raw_config(source: &str, destination: &str, subdir: &str) -> RawRunConfig {
    RawRunConfig {
        source: source.to_string(),
        destination: destination.to_string(),
        source_ref: None,
        destination_base: None,
        explicit_mappings: vec![],
        source_subdir: Some(subdir.to_string()),
        dest_subdir: None,
        rev_list_paths: vec![],
        rebase: RebaseOptions::default(),
        author_name: None,
        author_email: None,
        committer_name: None,
        committer_email: None,
        coauthor_action: None,
        filter_backend: FilterBackendChoice::Legacy,
        submit_pr: false,
        create_if_missing: false,
        keep_workspace: false,
        skip_preflight: false,
        dry_run: false,
        log_level: LogLevel::Info,
        teams_to_add: vec![],
    }
}

#[test]
fn preflight_passes_when_both_repos_exist_locally() {
    let source = init_bare_repo();
    let destination = init_bare_repo();

    let raw = raw_config(
        &source.path().to_string_lossy(),
        &destination.path().to_string_lossy(),
        "libs/widgets",
    );
    let config = RunConfig::validate(raw).unwrap();
    let report = preflight::run(&config, "update-from-main-abc1234");
    assert!(report.ok(), "preflight report: {:?}", report.checks);
}

#[test]
fn preflight_fails_when_destination_path_does_not_exist() {
    let source = init_bare_repo();

    let raw = raw_config(
        &source.path().to_string_lossy(),
        "/nonexistent/path/for/gitmux/tests",
        "libs/widgets",
    );
    let config = RunConfig::validate(raw).unwrap();
    let report = preflight::run(&config, "update-from-main-abc1234");
    assert!(!report.ok());
    assert!(report.failures().iter().any(|f| f.contains("destination-writable")));
}

#[test]
fn preflight_fails_when_destination_base_branch_is_missing() {
    let source = init_bare_repo();
    let destination = init_bare_repo();

    let mut raw = raw_config(
        &source.path().to_string_lossy(),
        &destination.path().to_string_lossy(),
        "libs/widgets",
    );
    raw.destination_base = Some("no-such-branch".to_string());
    let config = RunConfig::validate(raw).unwrap();
    let report = preflight::run(&config, "update-from-main-abc1234");
    assert!(!report.ok());
    assert!(report.failures().iter().any(|f| f.contains("destination-writable")));
}

#[test]
fn preflight_fails_when_source_ref_does_not_resolve() {
    let source = TempDir::new().unwrap();
    let status = std::process::Command::new("git")
        .args(["init", "-q", "-b", "main"])
        .current_dir(source.path())
        .status()
        .unwrap();
    assert!(status.success());
    std::process::Command::new("git")
        .args(["config", "user.email", "t@example.com"])
        .current_dir(source.path())
        .status()
        .unwrap();
    std::process::Command::new("git")
        .args(["config", "user.name", "Test"])
        .current_dir(source.path())
        .status()
        .unwrap();
    std::fs::write(source.path().join("a.txt"), "hi").unwrap();
    std::process::Command::new("git")
        .args(["add", "."])
        .current_dir(source.path())
        .status()
        .unwrap();
    std::process::Command::new("git")
        .args(["commit", "-q", "-m", "init"])
        .current_dir(source.path())
        .status()
        .unwrap();
    let destination = init_bare_repo();

    let mut raw = raw_config(
        &source.path().to_string_lossy(),
        &destination.path().to_string_lossy(),
        "libs/widgets",
    );
    raw.source_ref = Some("no-such-branch".to_string());
    let config = RunConfig::validate(raw).unwrap();
    let report = preflight::run(&config, "update-from-main-abc1234");
    assert!(!report.ok());
    assert!(report.failures().iter().any(|f| f.contains("source-readable")));
}

#[test]
fn skip_preflight_short_circuits_all_checks() {
    let mut raw = raw_config("/does/not/exist", "/also/does/not/exist", "libs");
    raw.skip_preflight = true;
    let config = RunConfig::validate(raw).unwrap();
    let report = preflight::run(&config, "update-from-main-abc1234");
    assert!(report.ok());
    assert_eq!(report.checks.len(), 1);
}

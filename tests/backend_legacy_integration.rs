//! Exercises the legacy filter backend against a real git repository,
//! mirroring the teacher's preference for subprocess-backed integration
//! tests over mocked git state.

use std::process::Command;

use gitmux::backend::{FilterBackend, RewriteRequest, legacy::LegacyBackend};
use gitmux::config::CoauthorAction;
use gitmux::config::mapping::PathMapping;
use tempfile::TempDir;

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git must be installed to run this test");
    assert!(status.success(), "git {args:?} failed");
}

fn init_repo_with_subtree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    git(path, &["init", "-q", "-b", "main"]);
    git(path, &["config", "user.email", "t@example.com"]);
    git(path, &["config", "user.name", "Test"]);

    std::fs::create_dir_all(path.join("libs/widgets")).unwrap();
    std::fs::write(path.join("libs/widgets/lib.rs"), "pub fn widget() {}").unwrap();
    std::fs::create_dir_all(path.join("apps/dashboard")).unwrap();
    std::fs::write(path.join("apps/dashboard/main.rs"), "fn main() {}").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-q", "-m", "initial import"]);

    std::fs::write(path.join("libs/widgets/lib.rs"), "pub fn widget() { /* v2 */ }").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-q", "-m", "update widget"]);

    dir
}

#[test]
fn single_mapping_subtree_extraction_keeps_only_matching_commits() {
    let dir = init_repo_with_subtree();
    let path = dir.path();

    let mapping = PathMapping {
        source: "libs/widgets".to_string(),
        destination: String::new(),
    };
    let request = RewriteRequest {
        repo_path: path,
        mappings: std::slice::from_ref(&mapping),
        rev_list_paths: &[],
        author_override: None,
        committer_override: None,
        coauthor_action: CoauthorAction::Keep,
    };

    LegacyBackend.rewrite(&request).expect("legacy rewrite should succeed");

    assert!(path.join("lib.rs").exists(), "widget source should now be at repo root");
    assert!(!path.join("libs").exists(), "original subdir prefix should be gone");
    assert!(!path.join("apps").exists(), "unrelated subtree should be dropped");

    let log = Command::new("git")
        .args(["log", "--oneline"])
        .current_dir(path)
        .output()
        .unwrap();
    let log_text = String::from_utf8_lossy(&log.stdout);
    // the "initial import" commit touched both subtrees, but filter-branch
    // with --prune-empty drops it if it becomes empty after filtering;
    // what matters is that no commit references apps/ content anymore.
    assert!(log_text.contains("widget"));
}

// Co-author scrubbing itself is covered at the unit level in
// `backend::message` — the `--msg-filter` shell-out relies on
// `std::env::current_exe()` resolving to the `gitmux` binary, which only
// holds at real runtime, not from a `cargo test` harness process, so it is
// not re-exercised as a subprocess round-trip here.

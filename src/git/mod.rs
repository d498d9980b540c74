pub mod url;

pub use url::GitRemoteUrl;

use anyhow::{Context, Result};

use crate::shell_exec::Cmd;

/// Thin wrapper over a local git checkout, following the teacher's
/// `Repository` pattern but trimmed to what the rewrite pipeline needs:
/// running git commands with a fixed working directory.
pub struct Repository {
    pub path: std::path::PathBuf,
}

impl Repository {
    pub fn at(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn run(&self, args: &[&str]) -> Result<String> {
        Cmd::new("git")
            .args(args.iter().copied())
            .current_dir(&self.path)
            .context(args.join(" "))
            .run_checked()
    }

    pub fn run_inherited(&self, args: &[&str]) -> Result<()> {
        Cmd::new("git")
            .args(args.iter().copied())
            .current_dir(&self.path)
            .context(args.join(" "))
            .run_inherited()
    }

    /// Resolves `ref_name` to a full commit SHA.
    pub fn rev_parse(&self, ref_name: &str) -> Result<String> {
        self.run(&["rev-parse", ref_name])
            .with_context(|| format!("could not resolve ref `{ref_name}`"))
    }

    /// First 7+ characters of a commit SHA, per the integration-branch
    /// naming contract (spec section 6).
    pub fn short_sha(&self, ref_name: &str) -> Result<String> {
        self.run(&["rev-parse", "--short=7", ref_name])
    }

    /// The branch `HEAD` currently points to, or `None` if detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let name = self.run(&["symbolic-ref", "--short", "-q", "HEAD"]);
        match name {
            Ok(branch) if !branch.is_empty() => Ok(Some(branch)),
            _ => Ok(None),
        }
    }

    /// Reads the in-progress rebase state directory, if any, the same way
    /// the teacher's `read_rebase_branch` inspects `.git/rebase-merge`.
    pub fn rebase_state(&self) -> Option<String> {
        let git_dir = self.path.join(".git");
        for state_dir in ["rebase-merge", "rebase-apply"] {
            if git_dir.join(state_dir).is_dir() {
                return Some(state_dir.to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::at(dir.path());
        repo.run(&["init", "-q", "-b", "main"]).unwrap();
        repo.run(&["config", "user.email", "t@example.com"]).unwrap();
        repo.run(&["config", "user.name", "Test"]).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        repo.run(&["add", "."]).unwrap();
        repo.run(&["commit", "-q", "-m", "initial"]).unwrap();
        (dir, repo)
    }

    #[test]
    fn rev_parse_resolves_head() {
        let (_dir, repo) = init_repo();
        let sha = repo.rev_parse("HEAD").unwrap();
        assert_eq!(sha.len(), 40);
    }

    #[test]
    fn short_sha_is_seven_chars_by_default() {
        let (_dir, repo) = init_repo();
        let short = repo.short_sha("HEAD").unwrap();
        assert!(short.len() >= 7);
    }

    #[test]
    fn current_branch_reports_main() {
        let (_dir, repo) = init_repo();
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
    }

    #[test]
    fn rebase_state_is_none_outside_a_rebase() {
        let (_dir, repo) = init_repo();
        assert_eq!(repo.rebase_state(), None);
    }
}

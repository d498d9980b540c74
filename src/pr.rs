//! PR Assembler (spec section 4.7): deterministic branch naming, push, and
//! `gh`-based PR creation. Grounded on the `gh pr list/create` subprocess
//! pattern used for cross-repo sync tooling elsewhere in the pack.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::config::{RebaseStrategy, RunConfig};
use crate::config::mapping::PathMapping;
use crate::diagnostics;
use crate::git::Repository;
use crate::shell_exec::Cmd;

/// Builds the deterministic integration branch name (spec section 6):
/// `update-from-{source_branch}-{short_sha}[-rebase-strategy-{strategy}]`.
/// The suffix is omitted for the default strategy (`theirs`).
pub fn integration_branch_name(
    source_branch: &str,
    short_sha: &str,
    strategy: RebaseStrategy,
) -> String {
    let base = format!("update-from-{source_branch}-{short_sha}");
    if strategy == RebaseStrategy::Theirs {
        base
    } else {
        format!("{base}-rebase-strategy-{strategy}")
    }
}

pub fn push_branch(repo: &Repository, remote: &str, branch: &str) -> Result<()> {
    repo.run(&["push", remote, &format!("HEAD:refs/heads/{branch}")])
        .with_context(|| format!("failed to push {branch} to {remote}"))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GhPrInfo {
    number: u64,
    url: String,
}

/// Looks for an already-open PR from `branch` into `base`, following the
/// `gh pr list --json` pattern.
fn find_existing_pr(destination_dir: &std::path::Path, branch: &str, base: &str) -> Result<Option<GhPrInfo>> {
    let output = Cmd::new("gh")
        .args([
            "pr", "list",
            "--head", branch,
            "--base", base,
            "--json", "number,url",
            "--limit", "1",
        ])
        .current_dir(destination_dir)
        .context("gh pr list")
        .run_checked()?;

    if output.trim().is_empty() || output.trim() == "[]" {
        return Ok(None);
    }
    let mut prs: Vec<GhPrInfo> = serde_json::from_str(&output).context("parsing gh pr list output")?;
    Ok(prs.pop())
}

fn format_gh_failure(what: &str, err: &anyhow::Error) -> String {
    format!("{what} failed: {err:#}")
}

pub struct PrBody {
    pub source_url: String,
    pub source_ref: String,
    pub source_short_sha: String,
    pub destination_url: String,
    pub base_branch: String,
    pub mappings: Vec<PathMapping>,
    pub strategy: RebaseStrategy,
}

impl PrBody {
    pub fn render(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!(
            "Syncing `{}` @ `{}` (`{}`) into `{}` @ `{}`.\n\n",
            self.source_url, self.source_ref, self.source_short_sha, self.destination_url, self.base_branch
        ));
        body.push_str("| source | destination |\n|---|---|\n");
        for mapping in &self.mappings {
            let src = if mapping.source.is_empty() { "." } else { &mapping.source };
            let dst = if mapping.destination.is_empty() { "." } else { &mapping.destination };
            body.push_str(&format!("| `{src}` | `{dst}` |\n"));
        }
        body.push_str(&format!("\nRebase strategy: `{}`\n", self.strategy));
        body
    }
}

/// Opens a PR via `gh pr create`, or returns the existing PR's URL if one
/// already exists from this branch into `base`.
pub fn open_pull_request(
    destination_dir: &std::path::Path,
    branch: &str,
    base: &str,
    title: &str,
    body: &PrBody,
) -> Result<String> {
    if let Some(existing) = find_existing_pr(destination_dir, branch, base)? {
        diagnostics::info(format!("PR #{} already open", existing.number));
        return Ok(existing.url);
    }

    let rendered = body.render();
    let output = Cmd::new("gh")
        .args([
            "pr", "create",
            "--head", branch,
            "--base", base,
            "--title", title,
            "--body", &rendered,
        ])
        .current_dir(destination_dir)
        .context("gh pr create")
        .run()
        .map_err(|e| anyhow::anyhow!(format_gh_failure("gh pr create", &e)))?;

    if !output.status.success() {
        bail!(
            "gh pr create failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Grants push access to a team on the destination repo, via `gh api`.
pub fn add_team(destination_repo_slug: &str, team: &str) -> Result<()> {
    let (org, team_slug) = team
        .split_once('/')
        .context("team identifier must be `org/team`")?;
    Cmd::new("gh")
        .args([
            "api",
            "--method", "PUT",
            &format!("/orgs/{org}/teams/{team_slug}/repos/{destination_repo_slug}"),
            "-f", "permission=push",
        ])
        .context("gh api: grant team push access")
        .run_checked()?;
    Ok(())
}

/// Creates the destination repo if `create_if_missing` and it does not yet
/// exist, private by default.
pub fn create_destination_if_missing(config: &RunConfig, slug: &str) -> Result<bool> {
    if !config.create_if_missing {
        return Ok(false);
    }
    let exists = Cmd::new("gh")
        .args(["repo", "view", slug])
        .context("gh repo view")
        .run()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if exists {
        return Ok(false);
    }
    Cmd::new("gh")
        .args(["repo", "create", slug, "--private"])
        .context("gh repo create")
        .run_checked()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_omits_suffix() {
        let name = integration_branch_name("main", "abc1234", RebaseStrategy::Theirs);
        assert_eq!(name, "update-from-main-abc1234");
    }

    #[test]
    fn non_default_strategy_appends_suffix() {
        let name = integration_branch_name("main", "abc1234", RebaseStrategy::Ours);
        assert_eq!(name, "update-from-main-abc1234-rebase-strategy-ours");
    }

    #[test]
    fn patience_strategy_appends_its_own_suffix() {
        let name = integration_branch_name("develop", "deadbee", RebaseStrategy::Patience);
        assert_eq!(name, "update-from-develop-deadbee-rebase-strategy-patience");
    }

    #[test]
    fn pr_body_lists_every_mapping() {
        let body = PrBody {
            source_url: "https://github.com/acme/mono".into(),
            source_ref: "main".into(),
            source_short_sha: "abc1234".into(),
            destination_url: "https://github.com/acme/widgets".into(),
            base_branch: "main".into(),
            mappings: vec![PathMapping { source: "libs/a".into(), destination: "a".into() }],
            strategy: RebaseStrategy::Theirs,
        };
        let rendered = body.render();
        assert!(rendered.contains("libs/a"));
        assert!(rendered.contains("theirs"));
    }
}

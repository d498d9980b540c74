//! The Rebase Engine (spec section 4.6).

use anyhow::{Context, Result};

use crate::config::{RebaseOptions, RebaseStrategy};
use crate::error::GitmuxError;
use crate::git::Repository;
use crate::shell_exec::Cmd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseResult {
    Rebased,
    UpToDate,
}

/// Adds `destination` as a remote named `gitmux-destination`, fetches
/// `base_branch`, and rebases the current branch onto it using the
/// configured strategy.
pub fn rebase_onto(
    repo: &Repository,
    destination: &str,
    base_branch: &str,
    options: &RebaseOptions,
) -> Result<RebaseResult, GitmuxError> {
    const REMOTE: &str = "gitmux-destination";

    add_remote_if_missing(repo, REMOTE, destination).map_err(GitmuxError::from)?;
    repo.run(&["fetch", REMOTE, base_branch])
        .with_context(|| format!("failed to fetch {base_branch} from destination"))
        .map_err(GitmuxError::from)?;

    let remote_ref = format!("{REMOTE}/{base_branch}");
    let merge_base = repo.run(&["merge-base", "HEAD", &remote_ref]);
    let head_sha = repo.rev_parse("HEAD").map_err(GitmuxError::from)?;
    if let Ok(base) = &merge_base {
        let remote_sha = repo.rev_parse(&remote_ref).map_err(GitmuxError::from)?;
        if *base == remote_sha && remote_sha != head_sha {
            // destination base is already an ancestor of our history and
            // we're strictly ahead: nothing to rebase.
            return Ok(RebaseResult::UpToDate);
        }
    }

    let mut args: Vec<String> = vec!["rebase".into()];
    args.push(strategy_option(options.strategy));
    args.push("--strategy-option".into());
    args.push(format!("diff-algorithm={}", options.diff_algorithm));
    args.extend(options.extra_options.iter().cloned());
    args.push(remote_ref.clone());

    if options.interactive {
        return Err(interactive_pause_error(repo, &remote_ref));
    }

    let output = Cmd::new("git")
        .args(args)
        .current_dir(&repo.path)
        .context("rebase onto destination base")
        .run()
        .map_err(GitmuxError::from)?;

    if output.status.success() {
        return Ok(RebaseResult::Rebased);
    }

    if repo.rebase_state().is_some() {
        return Err(GitmuxError::RebaseConflict {
            target_branch: base_branch.to_string(),
            workspace: Some(repo.path.clone()),
            git_output: format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Err(GitmuxError::Fatal(anyhow::anyhow!(
        "git rebase failed outside of a recognizable conflict state: {}",
        String::from_utf8_lossy(&output.stderr)
    )))
}

fn interactive_pause_error(repo: &Repository, remote_ref: &str) -> GitmuxError {
    GitmuxError::Fatal(anyhow::anyhow!(
        "interactive rebase requested: run `git rebase -i {remote_ref}` in {} and resume the pipeline manually",
        repo.path.display()
    ))
}

fn strategy_option(strategy: RebaseStrategy) -> String {
    match strategy {
        RebaseStrategy::Theirs => "--strategy-option=theirs".to_string(),
        RebaseStrategy::Ours => "--strategy-option=ours".to_string(),
        RebaseStrategy::Patience => "--strategy-option=patience".to_string(),
    }
}

fn add_remote_if_missing(repo: &Repository, name: &str, url: &str) -> Result<()> {
    let exists = repo.run(&["remote"]).map(|out| out.lines().any(|l| l == name))?;
    if exists {
        repo.run(&["remote", "set-url", name, url])?;
    } else {
        repo.run(&["remote", "add", name, url])?;
    }
    Ok(())
}

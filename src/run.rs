//! Orchestration driver (spec section 2, component 11): wires the
//! components into the documented pipeline. Grounded on the teacher's
//! `commands::merge::handle_merge` shape: load/validate config, gather the
//! operations to run, execute in sequence, clean up.

use anyhow::Context;

use crate::backend::{self, RewriteRequest};
use crate::config::RunConfig;
use crate::diagnostics;
use crate::error::GitmuxError;
use crate::git::Repository;
use crate::planner;
use crate::pr::{self, PrBody};
use crate::preflight;
use crate::rebase::{self, RebaseResult};
use crate::workspace::Workspace;

pub struct RunOutcome {
    pub integration_branch: String,
    pub pr_url: Option<String>,
    pub rebase_result: Option<RebaseResult>,
}

pub fn execute(config: RunConfig) -> Result<RunOutcome, GitmuxError> {
    diagnostics::set_level(config.log_level);

    let mut workspace = Workspace::create(config.keep_workspace).map_err(GitmuxError::from)?;

    let source_head_sha = resolve_source_head_sha(&config).map_err(GitmuxError::from)?;
    let short_sha = &source_head_sha[..source_head_sha.len().min(7)];
    let source_branch = config
        .source_ref
        .clone()
        .unwrap_or_else(|| "HEAD".to_string());

    let integration_branch =
        pr::integration_branch_name(&source_branch, short_sha, config.rebase.strategy);
    workspace.integration_branch = Some(integration_branch.clone());

    let report = preflight::run(&config, &integration_branch);
    for check in &report.checks {
        let line = format!("{}: {}", check.name, check.message);
        match check.status {
            preflight::CheckStatus::Pass => diagnostics::debug(line),
            preflight::CheckStatus::Warn => diagnostics::warning(line),
            preflight::CheckStatus::Fail => diagnostics::error(line),
        }
    }
    if !report.ok() {
        return Err(GitmuxError::Preflight(report.failures()));
    }

    if config.dry_run {
        diagnostics::info(format!(
            "dry run: would rewrite {} mapping(s) and open integration branch `{integration_branch}`",
            config.mappings.len()
        ));
        if config.keep_workspace {
            workspace.disarm();
        }
        return Ok(RunOutcome {
            integration_branch,
            pr_url: None,
            rebase_result: None,
        });
    }

    if let crate::git::url::RepoRef::Remote(url) = &config.destination {
        let slug = format!("{}/{}", url.owner, url.repo);
        pr::create_destination_if_missing(&config, &slug).map_err(GitmuxError::from)?;
    }

    clone_source(&config, &workspace).map_err(GitmuxError::from)?;
    let repo = Repository::at(&workspace.source_clone);

    repo.run(&["checkout", "-b", &integration_branch])
        .context("creating integration branch in the workspace clone")
        .map_err(GitmuxError::from)?;

    let plan = planner::plan(&config.mappings);
    let backend_kind = backend::resolve(config.filter_backend).map_err(GitmuxError::from)?;
    let backend_impl = backend::backend_for(backend_kind);
    let request = RewriteRequest::from_config(&workspace.source_clone, &config, plan);
    backend_impl
        .rewrite(&request)
        .map_err(|detail| GitmuxError::Backend {
            backend: match backend_kind {
                backend::BackendKind::Legacy => "legacy",
                backend::BackendKind::Modern => "modern",
            },
            mapping_index: None,
            detail: detail.to_string(),
        })?;

    let base_branch = resolve_destination_base(&config, &repo).map_err(GitmuxError::from)?;
    let rebase_result = rebase::rebase_onto(
        &repo,
        &config.destination.to_string(),
        &base_branch,
        &config.rebase,
    )
    .inspect_err(|_| {
        // the workspace path is already embedded in RebaseConflictError;
        // disarm isn't called so Drop will still clean up unless -k was set.
    })?;

    pr::push_branch(&repo, &config.destination.to_string(), &integration_branch)
        .map_err(GitmuxError::from)?;

    if !config.teams_to_add.is_empty() {
        if let crate::git::url::RepoRef::Remote(url) = &config.destination {
            let slug = format!("{}/{}", url.owner, url.repo);
            for team in &config.teams_to_add {
                pr::add_team(&slug, team).map_err(GitmuxError::from)?;
            }
        }
    }

    let pr_url = if config.submit_pr {
        let body = PrBody {
            source_url: config.source.to_string(),
            source_ref: source_branch.clone(),
            source_short_sha: short_sha.to_string(),
            destination_url: config.destination.to_string(),
            base_branch: base_branch.clone(),
            mappings: config.mappings.clone(),
            strategy: config.rebase.strategy,
        };
        let destination_path = config
            .local_source_path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| workspace.source_clone.clone());
        let title = format!("Sync from {source_branch} ({short_sha})");
        Some(
            pr::open_pull_request(&destination_path, &integration_branch, &base_branch, &title, &body)
                .map_err(GitmuxError::from)?,
        )
    } else {
        None
    };

    workspace.disarm();
    Ok(RunOutcome {
        integration_branch,
        pr_url,
        rebase_result: Some(rebase_result),
    })
}

/// True if `s` looks like a full commit SHA (40 hex chars) rather than a
/// branch or tag name. `ls-remote <url> <ref>` only matches refs by name, so
/// a bare SHA needs a different resolution path (and, for remote sources, a
/// clone-then-checkout instead of `clone --branch`).
fn looks_like_full_sha(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn resolve_source_head_sha(config: &RunConfig) -> anyhow::Result<String> {
    if let Some(local) = config.local_source_path() {
        let repo = Repository::at(local);
        return repo.rev_parse(config.source_ref.as_deref().unwrap_or("HEAD"));
    }
    if let Some(sha) = config.source_ref.as_deref().filter(|r| looks_like_full_sha(r)) {
        return Ok(sha.to_string());
    }
    // for a remote source, resolve via a lightweight `ls-remote` against
    // the requested ref rather than a full clone, matching the teacher's
    // preference for cheap read-only probes before any mutating step.
    let output = crate::shell_exec::Cmd::new("git")
        .args([
            "ls-remote",
            &config.source.to_string(),
            config.source_ref.as_deref().unwrap_or("HEAD"),
        ])
        .context("resolving source HEAD sha")
        .run_checked()?;
    output
        .split_whitespace()
        .next()
        .map(|s| s.to_string())
        .context("git ls-remote returned no SHA")
}

fn resolve_destination_base(config: &RunConfig, repo: &Repository) -> anyhow::Result<String> {
    if let Some(base) = &config.destination_base {
        return Ok(base.clone());
    }
    // auto-detect: ask the destination for its default branch via a
    // symbolic-ref probe against a temporary remote head query.
    let output = crate::shell_exec::Cmd::new("git")
        .args(["ls-remote", "--symref", &config.destination.to_string(), "HEAD"])
        .current_dir(&repo.path)
        .context("auto-detecting destination base branch")
        .run_checked()?;
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("ref: refs/heads/") {
            if let Some(branch) = rest.split_whitespace().next() {
                return Ok(branch.to_string());
            }
        }
    }
    Ok("main".to_string())
}

fn clone_source(config: &RunConfig, workspace: &Workspace) -> anyhow::Result<()> {
    let source = config.source.to_string();
    let dest = workspace.source_clone.to_string_lossy().into_owned();
    // never pass `--branch`: it only accepts branch/tag names, not a bare
    // commit SHA, and `source_ref` must support all three uniformly. Clone
    // the default branch, then check out the requested ref explicitly.
    crate::shell_exec::Cmd::new("git")
        .args(["clone", &source, &dest])
        .context("cloning source repository into workspace")
        .run_checked()?;
    if let Some(r) = &config.source_ref {
        crate::shell_exec::Cmd::new("git")
            .args(["checkout", r])
            .current_dir(&workspace.source_clone)
            .context("checking out requested source ref")
            .run_checked()?;
    }
    Ok(())
}

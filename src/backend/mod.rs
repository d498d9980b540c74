//! The Filter Backend abstraction (spec section 4.4): two implementations
//! with identical observable rewrite semantics.

pub mod legacy;
pub mod message;
pub mod modern;

use std::fmt;
use std::sync::OnceLock;

use anyhow::Result;

use crate::config::{CoauthorAction, FilterBackendChoice, Identity, RunConfig};
use crate::config::mapping::PathMapping;
use crate::diagnostics;
use crate::planner::ExecutionPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Legacy,
    Modern,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Legacy => write!(f, "legacy (git filter-branch)"),
            BackendKind::Modern => write!(f, "modern (git-filter-repo)"),
        }
    }
}

const MODERN_MIN_MAJOR: u32 = 3;
const MODERN_MIN_MINOR: u32 = 6;

/// True if `git-filter-repo` is on PATH and reports a runtime version of at
/// least 3.6.
pub fn modern_available() -> bool {
    let Ok(path) = which::which("git-filter-repo") else {
        return false;
    };
    let output = std::process::Command::new(path).arg("--version").output();
    let Ok(output) = output else { return false };
    if !output.status.success() {
        return false;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_version(&text)
        .map(|(major, minor)| (major, minor) >= (MODERN_MIN_MAJOR, MODERN_MIN_MINOR))
        .unwrap_or(false)
}

fn parse_version(text: &str) -> Option<(u32, u32)> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = digits.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

static RESOLVED_BACKEND: OnceLock<BackendKind> = OnceLock::new();

/// Resolves which backend this run uses, computing the `auto` choice once
/// and caching it in a process-global for the remainder of the run (spec
/// section 4.4).
pub fn resolve(choice: FilterBackendChoice) -> Result<BackendKind> {
    let kind = *RESOLVED_BACKEND.get_or_init(|| match choice {
        FilterBackendChoice::Legacy => BackendKind::Legacy,
        FilterBackendChoice::Modern => BackendKind::Modern,
        FilterBackendChoice::Auto => {
            if modern_available() {
                BackendKind::Modern
            } else {
                diagnostics::info("git-filter-repo not found; falling back to legacy backend");
                BackendKind::Legacy
            }
        }
    });

    if choice == FilterBackendChoice::Modern && !modern_available() {
        anyhow::bail!("modern backend requested but git-filter-repo is unavailable or below version 3.6");
    }

    Ok(kind)
}

/// Parameters shared by both backend implementations for a single rewrite
/// invocation.
pub struct RewriteRequest<'a> {
    pub repo_path: &'a std::path::Path,
    pub mappings: &'a [PathMapping],
    pub rev_list_paths: &'a [String],
    pub author_override: Option<&'a Identity>,
    pub committer_override: Option<&'a Identity>,
    pub coauthor_action: CoauthorAction,
    /// Single- vs multi-path execution, decided once by
    /// [`crate::planner::plan`]. Backends must branch on this rather than
    /// re-deriving the decision from `mappings.len()`.
    pub plan: ExecutionPlan,
}

impl<'a> RewriteRequest<'a> {
    pub fn from_config(
        repo_path: &'a std::path::Path,
        config: &'a RunConfig,
        plan: ExecutionPlan,
    ) -> Self {
        Self {
            repo_path,
            mappings: &config.mappings,
            rev_list_paths: &config.rev_list_paths,
            author_override: config.author_override.as_ref(),
            committer_override: config.committer_override.as_ref(),
            coauthor_action: config.coauthor_action,
            plan,
        }
    }
}

/// The pluggable rewrite interface (spec section 4.4). Both `legacy` and
/// `modern` implement this identically from the caller's point of view.
pub trait FilterBackend {
    fn kind(&self) -> BackendKind;
    fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<()>;
}

pub fn backend_for(kind: BackendKind) -> Box<dyn FilterBackend> {
    match kind {
        BackendKind::Legacy => Box::new(legacy::LegacyBackend),
        BackendKind::Modern => Box::new(modern::ModernBackend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_semver_prefix() {
        assert_eq!(parse_version("git-filter-repo 3.6\n"), Some((3, 6)));
    }

    #[test]
    fn parses_patch_suffixed_version() {
        assert_eq!(parse_version("2.47.1 (Apple Git)"), Some((2, 47)));
    }

    #[test]
    fn rejects_text_without_digits() {
        assert_eq!(parse_version("not a version"), None);
    }

    #[test]
    fn backend_kind_display_names_match_spec_wording() {
        assert_eq!(BackendKind::Legacy.to_string(), "legacy (git filter-branch)");
        assert_eq!(BackendKind::Modern.to_string(), "modern (git-filter-repo)");
    }
}

//! Repository reference parsing (spec section 4.1 and 6).
//!
//! Accepts `git@host:owner/repo[.git]`, `https://host/owner/repo[.git]`,
//! `http://host/owner/repo[.git]`, `ssh://git@host/owner/repo[.git]`, and
//! absolute/relative local filesystem paths.

use std::fmt;

/// A parsed remote repository reference, or a local filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    Remote(GitRemoteUrl),
    Local(std::path::PathBuf),
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoRef::Remote(url) => write!(f, "{url}"),
            RepoRef::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// `{host, owner, repo}` extracted from a remote URL, per the contract in
/// spec section 6, plus the original URL text the caller supplied.
/// `{host, owner, repo}` are for display and PR-body rendering only (spec
/// section 4.1); every live `git` invocation must use `original` instead,
/// since the decomposed form alone is not a clonable/pushable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemoteUrl {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub original: String,
}

impl fmt::Display for GitRemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl GitRemoteUrl {
    /// Parses a remote URL in any of the forms the spec names.
    ///
    /// ```
    /// use gitmux::git::url::GitRemoteUrl;
    /// let url = GitRemoteUrl::parse("git@github.com:owner/repo.git").unwrap();
    /// assert_eq!(url.host, "github.com");
    /// assert_eq!(url.owner, "owner");
    /// assert_eq!(url.repo, "repo");
    /// assert_eq!(url.to_string(), "git@github.com:owner/repo.git");
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        if let Some(rest) = input.strip_prefix("git@") {
            let (host, path) = rest.split_once(':')?;
            return Self::from_host_and_path(host, path, input);
        }
        for scheme in ["https://", "http://"] {
            if let Some(rest) = input.strip_prefix(scheme) {
                let (host, path) = rest.split_once('/')?;
                return Self::from_host_and_path(host, path, input);
            }
        }
        if let Some(rest) = input.strip_prefix("ssh://") {
            // ssh://git@host/owner/repo or ssh://host/owner/repo
            let rest = rest.strip_prefix("git@").unwrap_or(rest);
            let (host, path) = rest.split_once('/')?;
            return Self::from_host_and_path(host, path, input);
        }
        None
    }

    fn from_host_and_path(host: &str, path: &str, original: &str) -> Option<Self> {
        let path = path.trim_start_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, repo) = path.split_once('/')?;
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(GitRemoteUrl {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            original: original.to_string(),
        })
    }
}

/// Parses a repo reference: a remote URL if recognized, otherwise treated as
/// a local filesystem path.
pub fn parse_repo_ref(input: &str) -> RepoRef {
    match GitRemoteUrl::parse(input) {
        Some(url) => RepoRef::Remote(url),
        None => RepoRef::Local(std::path::PathBuf::from(input)),
    }
}

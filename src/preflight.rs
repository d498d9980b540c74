//! Preflight validation (spec section 4.3): prove a run can succeed before
//! any mutating step runs.

use std::thread;

use crate::backend::{self, BackendKind};
use crate::config::RunConfig;
use crate::git::url::RepoRef;
use crate::shell_exec::Cmd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn ok(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn failures(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .map(|c| format!("{}: {}", c.name, c.message))
            .collect()
    }
}

fn tool_on_path(name: &str) -> bool {
    which::which(name).is_ok()
}

fn check_required_tools(config: &RunConfig) -> CheckResult {
    let mut missing = Vec::new();
    if !tool_on_path("git") {
        missing.push("git");
    }
    if (config.submit_pr || config.create_if_missing) && !tool_on_path("gh") {
        missing.push("gh");
    }
    if missing.is_empty() {
        CheckResult {
            name: "required-tools",
            status: CheckStatus::Pass,
            message: "all required tools present".to_string(),
        }
    } else {
        CheckResult {
            name: "required-tools",
            status: CheckStatus::Fail,
            message: format!("missing tool(s): {}", missing.join(", ")),
        }
    }
}

/// True if `s` looks like a full commit SHA (40 hex chars). `ls-remote`
/// matches refs by name, so a bare SHA can't be confirmed against a remote
/// without a clone; we treat it as provisionally valid here and let the
/// clone/checkout step (spec section 4.2) surface an unknown SHA.
fn looks_like_full_sha(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn check_source_readable(config: &RunConfig) -> CheckResult {
    match &config.source {
        RepoRef::Local(path) => {
            let reachable = path.join(".git").is_dir() || path.is_dir();
            if !reachable {
                return CheckResult {
                    name: "source-readable",
                    status: CheckStatus::Fail,
                    message: format!("{} is not reachable", config.source),
                };
            }
            if let Some(source_ref) = &config.source_ref {
                let resolves = Cmd::new("git")
                    .args(["rev-parse", "--verify", "--quiet", &format!("{source_ref}^{{commit}}")])
                    .current_dir(path)
                    .context("preflight: source ref existence")
                    .run()
                    .map(|o| o.status.success())
                    .unwrap_or(false);
                if !resolves {
                    return CheckResult {
                        name: "source-readable",
                        status: CheckStatus::Fail,
                        message: format!("{} has no ref `{source_ref}`", config.source),
                    };
                }
            }
            CheckResult {
                name: "source-readable",
                status: CheckStatus::Pass,
                message: format!("{} is reachable", config.source),
            }
        }
        RepoRef::Remote(_url) => {
            let Some(source_ref) = config.source_ref.as_deref() else {
                let reachable = Cmd::new("git")
                    .args(["ls-remote", &config.source.to_string()])
                    .context("preflight: source reachability")
                    .run()
                    .map(|o| o.status.success())
                    .unwrap_or(false);
                return if reachable {
                    CheckResult {
                        name: "source-readable",
                        status: CheckStatus::Pass,
                        message: format!("{} is reachable", config.source),
                    }
                } else {
                    CheckResult {
                        name: "source-readable",
                        status: CheckStatus::Fail,
                        message: format!("{} is not reachable", config.source),
                    }
                };
            };
            if looks_like_full_sha(source_ref) {
                return CheckResult {
                    name: "source-readable",
                    status: CheckStatus::Pass,
                    message: format!(
                        "{} is reachable (SHA `{source_ref}` will be verified on checkout)",
                        config.source
                    ),
                };
            }
            let output = Cmd::new("git")
                .args(["ls-remote", &config.source.to_string(), source_ref])
                .context("preflight: source ref reachability")
                .run()
                .ok();
            let resolved = output.is_some_and(|o| {
                o.status.success() && !String::from_utf8_lossy(&o.stdout).trim().is_empty()
            });
            if resolved {
                CheckResult {
                    name: "source-readable",
                    status: CheckStatus::Pass,
                    message: format!("{} resolves at `{source_ref}`", config.source),
                }
            } else {
                CheckResult {
                    name: "source-readable",
                    status: CheckStatus::Fail,
                    message: format!("{} has no ref `{source_ref}`", config.source),
                }
            }
        }
    }
}

fn check_destination_writable(config: &RunConfig) -> CheckResult {
    let reachable = match &config.destination {
        RepoRef::Local(path) => path.join(".git").is_dir() || path.is_dir(),
        RepoRef::Remote(_url) => Cmd::new("git")
            .args(["ls-remote", &config.destination.to_string()])
            .context("preflight: destination reachability")
            .run()
            .map(|o| o.status.success())
            .unwrap_or(false),
    };
    if !reachable {
        return CheckResult {
            name: "destination-writable",
            status: CheckStatus::Fail,
            message: format!("{} is not reachable or not writable", config.destination),
        };
    }

    if let Some(base) = &config.destination_base {
        let base_exists = match &config.destination {
            RepoRef::Local(path) => Cmd::new("git")
                .args(["rev-parse", "--verify", "--quiet", base])
                .current_dir(path)
                .context("preflight: destination base existence")
                .run()
                .map(|o| o.status.success())
                .unwrap_or(false),
            RepoRef::Remote(_url) => Cmd::new("git")
                .args(["ls-remote", "--exit-code", "--heads", &config.destination.to_string(), base])
                .context("preflight: destination base existence")
                .run()
                .map(|o| o.status.success())
                .unwrap_or(false),
        };
        if !base_exists {
            return CheckResult {
                name: "destination-writable",
                status: CheckStatus::Fail,
                message: format!("{} has no base branch `{base}`", config.destination),
            };
        }
    }

    CheckResult {
        name: "destination-writable",
        status: CheckStatus::Pass,
        message: format!("{} is reachable", config.destination),
    }
}

fn check_backend(config: &RunConfig) -> CheckResult {
    match config.filter_backend {
        crate::config::FilterBackendChoice::Legacy => CheckResult {
            name: "filter-backend",
            status: CheckStatus::Pass,
            message: "using legacy backend (git filter-branch)".to_string(),
        },
        crate::config::FilterBackendChoice::Modern => {
            if backend::modern_available() {
                CheckResult {
                    name: "filter-backend",
                    status: CheckStatus::Pass,
                    message: "using modern backend (git-filter-repo)".to_string(),
                }
            } else {
                CheckResult {
                    name: "filter-backend",
                    status: CheckStatus::Fail,
                    message: "git-filter-repo not found or below required version 3.6".to_string(),
                }
            }
        }
        crate::config::FilterBackendChoice::Auto => {
            if backend::modern_available() {
                CheckResult {
                    name: "filter-backend",
                    status: CheckStatus::Pass,
                    message: format!("auto-selected {}", BackendKind::Modern),
                }
            } else {
                CheckResult {
                    name: "filter-backend",
                    status: CheckStatus::Warn,
                    message: format!(
                        "git-filter-repo unavailable; will use {}",
                        BackendKind::Legacy
                    ),
                }
            }
        }
    }
}

fn check_integration_branch_available(config: &RunConfig, branch_name: &str) -> CheckResult {
    let exists = match &config.destination {
        RepoRef::Local(path) => Cmd::new("git")
            .args(["rev-parse", "--verify", "--quiet", branch_name])
            .current_dir(path)
            .context("preflight: integration branch collision")
            .run()
            .map(|o| o.status.success())
            .unwrap_or(false),
        RepoRef::Remote(_) => Cmd::new("git")
            .args(["ls-remote", "--exit-code", "--heads", &config.destination.to_string(), branch_name])
            .context("preflight: integration branch collision")
            .run()
            .map(|o| o.status.success())
            .unwrap_or(false),
    };
    if exists {
        CheckResult {
            name: "integration-branch-available",
            status: CheckStatus::Fail,
            message: format!("branch `{branch_name}` already exists at destination"),
        }
    } else {
        CheckResult {
            name: "integration-branch-available",
            status: CheckStatus::Pass,
            message: format!("branch `{branch_name}` is available"),
        }
    }
}

fn check_teams(config: &RunConfig) -> CheckResult {
    if config.teams_to_add.is_empty() {
        return CheckResult {
            name: "teams-resolvable",
            status: CheckStatus::Pass,
            message: "no teams requested".to_string(),
        };
    }
    // Team resolution requires `gh`; absence is already reported by
    // required-tools, so this check only validates the identifier shape.
    let malformed: Vec<&str> = config
        .teams_to_add
        .iter()
        .filter(|t| !t.contains('/'))
        .map(String::as_str)
        .collect();
    if malformed.is_empty() {
        CheckResult {
            name: "teams-resolvable",
            status: CheckStatus::Pass,
            message: format!("{} team(s) well-formed", config.teams_to_add.len()),
        }
    } else {
        CheckResult {
            name: "teams-resolvable",
            status: CheckStatus::Fail,
            message: format!("malformed team identifier(s): {}", malformed.join(", ")),
        }
    }
}

/// Runs every independent check, in parallel where safe, and reassembles
/// the report in the fixed declaration order regardless of completion
/// order (spec section 4.3 and section 5).
pub fn run(config: &RunConfig, integration_branch_name: &str) -> PreflightReport {
    if config.skip_preflight {
        return PreflightReport {
            checks: vec![CheckResult {
                name: "preflight",
                status: CheckStatus::Pass,
                message: "skipped (-S)".to_string(),
            }],
        };
    }

    let (tools, source, destination, backend, branch, teams) = thread::scope(|scope| {
        let tools = scope.spawn(|| check_required_tools(config));
        let source = scope.spawn(|| check_source_readable(config));
        let destination = scope.spawn(|| check_destination_writable(config));
        let backend = scope.spawn(|| check_backend(config));
        let branch = scope.spawn(|| check_integration_branch_available(config, integration_branch_name));
        let teams = scope.spawn(|| check_teams(config));
        (
            tools.join().unwrap(),
            source.join().unwrap(),
            destination.join().unwrap(),
            backend.join().unwrap(),
            branch.join().unwrap(),
            teams.join().unwrap(),
        )
    });

    PreflightReport {
        checks: vec![tools, source, destination, backend, branch, teams],
    }
}

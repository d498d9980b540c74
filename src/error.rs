//! Top-level error kinds and the exit-code contract (spec section 7).

use std::fmt;

use crate::diagnostics::constants::{ERROR_BOLD, ERROR_EMOJI, HINT, HINT_EMOJI, RESET};

/// The kind of failure that ended a run. Each variant maps to exactly one
/// process exit code; see [`GitmuxError::exit_code`].
#[derive(Debug)]
pub enum GitmuxError {
    /// Argument parsing, mutually-exclusive options, mapping overlap,
    /// half-specified identity overrides.
    Config(String),
    /// Any preflight check reported `fail`.
    Preflight(Vec<String>),
    /// A filter backend invocation failed.
    Backend {
        backend: &'static str,
        mapping_index: Option<usize>,
        detail: String,
    },
    /// The rebase could not be completed automatically in non-interactive
    /// mode.
    RebaseConflict {
        target_branch: String,
        workspace: Option<std::path::PathBuf>,
        git_output: String,
    },
    /// Clone, fetch, push, or PR-create against a remote failed.
    Remote(String),
    /// Any other runtime failure that does not fit the categories above.
    Fatal(anyhow::Error),
}

impl GitmuxError {
    pub fn exit_code(&self) -> i32 {
        match self {
            GitmuxError::Config(_) => 2,
            GitmuxError::Preflight(_) => 3,
            GitmuxError::Backend { .. } => 1,
            GitmuxError::RebaseConflict { .. } => 1,
            GitmuxError::Remote(_) => 4,
            GitmuxError::Fatal(_) => 1,
        }
    }
}

impl fmt::Display for GitmuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitmuxError::Config(msg) => {
                write!(f, "{ERROR_EMOJI} {ERROR_BOLD}configuration error:{RESET} {msg}")
            }
            GitmuxError::Preflight(failures) => {
                writeln!(f, "{ERROR_EMOJI} {ERROR_BOLD}preflight failed:{RESET}")?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  - {failure}")?;
                }
                Ok(())
            }
            GitmuxError::Backend {
                backend,
                mapping_index,
                detail,
            } => {
                write!(
                    f,
                    "{ERROR_EMOJI} {ERROR_BOLD}{backend} backend failed{RESET}"
                )?;
                if let Some(idx) = mapping_index {
                    write!(f, " on mapping #{idx}")?;
                }
                write!(f, ": {detail}")
            }
            GitmuxError::RebaseConflict {
                target_branch,
                workspace,
                git_output,
            } => {
                writeln!(
                    f,
                    "{ERROR_EMOJI} {ERROR_BOLD}rebase onto {target_branch} has conflicts{RESET}"
                )?;
                writeln!(f, "{git_output}")?;
                match workspace {
                    Some(path) => write!(
                        f,
                        "{HINT_EMOJI} {HINT}resolve the conflict in {}, then re-run with -k next time to inspect state on failure{RESET}",
                        path.display()
                    ),
                    None => write!(
                        f,
                        "{HINT_EMOJI} {HINT}the workspace was already removed; re-run with -k to keep it on failure{RESET}"
                    ),
                }
            }
            GitmuxError::Remote(msg) => {
                write!(f, "{ERROR_EMOJI} {ERROR_BOLD}remote operation failed:{RESET} {msg}")
            }
            GitmuxError::Fatal(err) => {
                write!(f, "{ERROR_EMOJI} {ERROR_BOLD}fatal:{RESET} {err:#}")
            }
        }
    }
}

impl std::error::Error for GitmuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GitmuxError::Fatal(err) => err.source(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for GitmuxError {
    fn from(err: anyhow::Error) -> Self {
        GitmuxError::Fatal(err)
    }
}

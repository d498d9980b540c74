//! Ephemeral scratch-directory lifecycle (spec section 4.2).
//!
//! Mirrors the `WorktreeGuard` pattern: a `Drop` impl removes the directory
//! unless the run either disarms it on success-with-`keep_workspace`, or the
//! caller explicitly disarms it after teardown has already happened.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::diagnostics;

pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    keep: bool,
    pub source_clone: PathBuf,
    pub integration_branch: Option<String>,
}

impl Workspace {
    /// Creates a new scratch directory under the system temp dir.
    pub fn create(keep: bool) -> Result<Self> {
        let dir = TempDir::with_prefix("gitmux-").context("failed to create workspace directory")?;
        let root = dir.path().to_path_buf();
        let source_clone = root.join("source");
        diagnostics::debug(format!("workspace created at {}", root.display()));
        Ok(Self {
            dir: Some(dir),
            root,
            keep,
            source_clone,
            integration_branch: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prevents the `Drop` impl from removing the directory, e.g. because
    /// `keep_workspace` was requested or the caller already logged its path
    /// for manual inspection after a failure.
    pub fn disarm(&mut self) {
        if let Some(dir) = self.dir.take() {
            // `into_path` leaks management of the directory to the OS;
            // it is intentionally left on disk for the operator.
            let _ = dir.keep();
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.keep {
            diagnostics::hint(format!(
                "workspace kept at {} (-k was set)",
                self.root.display()
            ));
            self.disarm();
            return;
        }
        if self.dir.is_some() {
            diagnostics::debug(format!("removing workspace {}", self.root.display()));
        }
        // dropping `self.dir` (if still `Some`) removes the directory.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_directory_exists_while_alive() {
        let ws = Workspace::create(false).unwrap();
        assert!(ws.root().is_dir());
    }

    #[test]
    fn workspace_directory_removed_on_drop_without_keep() {
        let ws = Workspace::create(false).unwrap();
        let root = ws.root().to_path_buf();
        drop(ws);
        assert!(!root.exists());
    }

    #[test]
    fn workspace_directory_survives_drop_when_kept() {
        let ws = Workspace::create(true).unwrap();
        let root = ws.root().to_path_buf();
        drop(ws);
        assert!(root.exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn explicit_disarm_prevents_removal() {
        let mut ws = Workspace::create(false).unwrap();
        let root = ws.root().to_path_buf();
        ws.disarm();
        drop(ws);
        assert!(root.exists());
        std::fs::remove_dir_all(&root).ok();
    }
}

//! Subprocess execution wrapper with structured debug-level tracing.
//!
//! Every external tool invocation in this crate (`git`, `git-filter-repo`,
//! `gh`) goes through [`Cmd`] so that `-v`/`-vv` gives a uniform trace of
//! what ran, how long it took, and whether it succeeded. Argument lists are
//! always built structurally (`Vec<OsString>`), never by interpolating user
//! input into a shell string.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use anyhow::{Context, Result, bail};

/// A single external-command invocation, built up structurally.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    context: Option<String>,
}

impl Cmd {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            context: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    fn build(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }

    /// Run the command, capturing stdout/stderr, and return the raw
    /// [`Output`]. Always logs a `[gitmux-trace]` line after completion.
    pub fn run(&self) -> Result<Output> {
        let cmd_str = self.display();
        let ctx = self.context.as_deref().unwrap_or("");
        log::debug!("$ {cmd_str} [{ctx}]");

        let started = Instant::now();
        let mut command = self.build();
        command.stdin(Stdio::null());
        let output = command
            .output()
            .with_context(|| format!("failed to spawn `{cmd_str}`"))?;
        let dur = started.elapsed();

        log::debug!(
            "[gitmux-trace] context={ctx} cmd=\"{cmd_str}\" dur={:.1}ms ok={}",
            dur.as_secs_f64() * 1000.0,
            output.status.success()
        );

        Ok(output)
    }

    /// Run the command and return stdout as a `String`, bailing with
    /// combined stderr+stdout on nonzero exit.
    pub fn run_checked(&self) -> Result<String> {
        let output = self.run()?;
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`{}` failed ({}):\n{stdout}{stderr}",
                self.display(),
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run the command purely for its side effect, treating nonzero exit as
    /// failure, without capturing output (inherits the parent's streams).
    pub fn run_inherited(&self) -> Result<()> {
        let cmd_str = self.display();
        let ctx = self.context.as_deref().unwrap_or("");
        log::debug!("$ {cmd_str} [{ctx}]");

        let started = Instant::now();
        let status = self
            .build()
            .status()
            .with_context(|| format!("failed to spawn `{cmd_str}`"))?;
        let dur = started.elapsed();
        log::debug!(
            "[gitmux-trace] context={ctx} cmd=\"{cmd_str}\" dur={:.1}ms ok={}",
            dur.as_secs_f64() * 1000.0,
            status.success()
        );

        if !status.success() {
            bail!("`{cmd_str}` exited with {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_checked_captures_stdout() {
        let out = Cmd::new("echo").arg("hello").run_checked().unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn run_checked_bails_on_nonzero_exit() {
        let err = Cmd::new("sh")
            .args(["-c", "exit 7"])
            .run_checked()
            .unwrap_err();
        assert!(err.to_string().contains("failed"));
    }

    #[test]
    fn display_joins_program_and_args() {
        let cmd = Cmd::new("git").args(["status", "--short"]);
        assert_eq!(cmd.display(), "git status --short");
    }
}

//! Argument parsing and the `GITMUX_*` environment-variable surface (spec
//! section 6). Mirrors the teacher's `clap::Parser` style, trimmed to a
//! single flat command.

use clap::Parser;

use crate::config::{CoauthorAction, FilterBackendChoice, RawRunConfig, RebaseOptions, RebaseStrategy};
use crate::diagnostics::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "gitmux",
    version,
    about = "Sync a subtree of one git repository into another, with full history and an optional PR."
)]
pub struct Cli {
    /// Source repository (URL or local path).
    #[arg(short = 'r', long, env = "GITMUX_SOURCE")]
    pub source: String,

    /// Destination repository (URL or local path).
    #[arg(short = 't', long, env = "GITMUX_DESTINATION")]
    pub destination: String,

    /// Branch, tag, or commit to check out at the source before rewriting.
    #[arg(short = 'g', long = "ref", env = "GITMUX_REF")]
    pub source_ref: Option<String>,

    /// Base branch at the destination (auto-detected if omitted).
    #[arg(short = 'b', long = "base", env = "GITMUX_BASE")]
    pub destination_base: Option<String>,

    /// Explicit `src:dst` mapping; repeatable. Mutually exclusive with
    /// `-d`/`-p`.
    #[arg(short = 'm', long = "map", env = "GITMUX_MAP", value_delimiter = ',')]
    pub explicit_mappings: Vec<String>,

    /// Legacy single-subtree source path.
    #[arg(short = 'd', long = "subdir", env = "GITMUX_SUBDIR")]
    pub source_subdir: Option<String>,

    /// Legacy single-subtree destination path.
    #[arg(short = 'p', long = "dest-subdir", env = "GITMUX_DEST_SUBDIR")]
    pub dest_subdir: Option<String>,

    /// File whitelist; only these paths survive the rewrite.
    #[arg(short = 'l', long = "rev-list", env = "GITMUX_REV_LIST", value_delimiter = ',')]
    pub rev_list_paths: Vec<String>,

    /// Rebase conflict strategy.
    #[arg(short = 'X', long = "rebase-strategy", env = "GITMUX_REBASE_STRATEGY", default_value = "theirs")]
    pub rebase_strategy: RebaseStrategy,

    /// Diff algorithm passed to the rebase.
    #[arg(long = "diff-algorithm", env = "GITMUX_DIFF_ALGORITHM", default_value = "histogram")]
    pub diff_algorithm: String,

    /// Extra rebase options, passed through verbatim.
    #[arg(short = 'o', long = "rebase-option", env = "GITMUX_REBASE_OPTION", value_delimiter = ',')]
    pub extra_rebase_options: Vec<String>,

    /// Pause for a manual interactive rebase instead of resolving automatically.
    #[arg(short = 'i', long, env = "GITMUX_INTERACTIVE")]
    pub interactive: bool,

    /// Create the destination repo if it does not already exist.
    #[arg(short = 'c', long = "create-if-missing", env = "GITMUX_CREATE_IF_MISSING")]
    pub create_if_missing: bool,

    /// Open a pull request at the destination once the branch is pushed.
    #[arg(short = 's', long = "submit-pr", env = "GITMUX_SUBMIT_PR")]
    pub submit_pr: bool,

    /// Grant push access to `org/team`; repeatable.
    #[arg(short = 'z', long = "team", env = "GITMUX_TEAM", value_delimiter = ',')]
    pub teams_to_add: Vec<String>,

    /// Keep the scratch workspace on disk after the run.
    #[arg(short = 'k', long = "keep-workspace", env = "GITMUX_KEEP_WORKSPACE")]
    pub keep_workspace: bool,

    /// Verbose output; forces debug-level diagnostics.
    #[arg(short = 'v', long, env = "GITMUX_VERBOSE")]
    pub verbose: bool,

    /// Resolve configuration and print it, without cloning or mutating anything.
    #[arg(short = 'D', long = "dry-run", env = "GITMUX_DRY_RUN")]
    pub dry_run: bool,

    /// Skip preflight validation.
    #[arg(short = 'S', long = "skip-preflight", env = "GITMUX_SKIP_PREFLIGHT")]
    pub skip_preflight: bool,

    /// Minimum diagnostic level to print.
    #[arg(short = 'L', long = "log-level", env = "GITMUX_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Which history-rewrite backend to use.
    #[arg(long = "filter-backend", env = "GITMUX_FILTER_BACKEND", default_value = "auto")]
    pub filter_backend: FilterBackendChoice,

    #[arg(long = "author-name", env = "GITMUX_AUTHOR_NAME")]
    pub author_name: Option<String>,
    #[arg(long = "author-email", env = "GITMUX_AUTHOR_EMAIL")]
    pub author_email: Option<String>,
    #[arg(long = "committer-name", env = "GITMUX_COMMITTER_NAME")]
    pub committer_name: Option<String>,
    #[arg(long = "committer-email", env = "GITMUX_COMMITTER_EMAIL")]
    pub committer_email: Option<String>,

    /// What to do with Claude/Anthropic co-author trailers.
    #[arg(long = "coauthor-action", env = "GITMUX_COAUTHOR_ACTION")]
    pub coauthor_action: Option<CoauthorAction>,
}

impl Cli {
    pub fn into_raw_config(self) -> RawRunConfig {
        let log_level = if self.verbose { LogLevel::Debug } else { self.log_level };
        RawRunConfig {
            source: self.source,
            destination: self.destination,
            source_ref: self.source_ref,
            destination_base: self.destination_base,
            explicit_mappings: self.explicit_mappings,
            source_subdir: self.source_subdir,
            dest_subdir: self.dest_subdir,
            rev_list_paths: self.rev_list_paths,
            rebase: RebaseOptions {
                strategy: self.rebase_strategy,
                diff_algorithm: self.diff_algorithm,
                extra_options: self.extra_rebase_options,
                interactive: self.interactive,
            },
            author_name: self.author_name,
            author_email: self.author_email,
            committer_name: self.committer_name,
            committer_email: self.committer_email,
            coauthor_action: self.coauthor_action,
            filter_backend: self.filter_backend,
            submit_pr: self.submit_pr,
            create_if_missing: self.create_if_missing,
            keep_workspace: self.keep_workspace,
            skip_preflight: self.skip_preflight,
            dry_run: self.dry_run,
            log_level,
            teams_to_add: self.teams_to_add,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_required_arguments() {
        let cli = Cli::parse_from([
            "gitmux",
            "-r", "https://github.com/acme/mono.git",
            "-t", "https://github.com/acme/widgets.git",
            "-d", "libs/widgets",
        ]);
        assert_eq!(cli.source, "https://github.com/acme/mono.git");
        assert_eq!(cli.rebase_strategy, RebaseStrategy::Theirs);
    }

    #[test]
    fn repeated_map_flags_accumulate() {
        let cli = Cli::parse_from([
            "gitmux",
            "-r", "src",
            "-t", "dst",
            "-m", "a:b",
            "-m", "c:d",
        ]);
        assert_eq!(cli.explicit_mappings, vec!["a:b", "c:d"]);
    }

    #[test]
    fn verbose_flag_forces_debug_log_level() {
        let cli = Cli::parse_from([
            "gitmux", "-r", "src", "-t", "dst", "-d", "libs", "-v",
        ]);
        let raw = cli.into_raw_config();
        assert_eq!(raw.log_level, LogLevel::Debug);
    }
}

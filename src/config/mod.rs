//! The validated, frozen run configuration (spec section 3).

pub mod mapping;

use mapping::{PathMapping, check_no_overlap};

use crate::diagnostics::LogLevel;
use crate::git::url::{RepoRef, parse_repo_ref};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RebaseStrategy {
    Theirs,
    Ours,
    Patience,
}

impl Default for RebaseStrategy {
    fn default() -> Self {
        RebaseStrategy::Theirs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FilterBackendChoice {
    Auto,
    Legacy,
    Modern,
}

impl Default for FilterBackendChoice {
    fn default() -> Self {
        FilterBackendChoice::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CoauthorAction {
    Claude,
    All,
    Keep,
}

impl Default for CoauthorAction {
    fn default() -> Self {
        CoauthorAction::Keep
    }
}

/// A fully-specified identity (name + email). The config layer rejects
/// partial overrides; see [`RunConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct RebaseOptions {
    pub strategy: RebaseStrategy,
    pub diff_algorithm: String,
    pub extra_options: Vec<String>,
    pub interactive: bool,
}

impl Default for RebaseOptions {
    fn default() -> Self {
        Self {
            strategy: RebaseStrategy::default(),
            diff_algorithm: "histogram".to_string(),
            extra_options: Vec::new(),
            interactive: false,
        }
    }
}

/// The validated, immutable run configuration (spec section 3). Construct
/// via [`RunConfig::validate`]; there is no public way to build an
/// unvalidated instance.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: RepoRef,
    pub destination: RepoRef,
    pub source_ref: Option<String>,
    pub destination_base: Option<String>,
    pub mappings: Vec<PathMapping>,
    pub rev_list_paths: Vec<String>,
    pub rebase: RebaseOptions,
    pub author_override: Option<Identity>,
    pub committer_override: Option<Identity>,
    pub coauthor_action: CoauthorAction,
    pub filter_backend: FilterBackendChoice,
    pub submit_pr: bool,
    pub create_if_missing: bool,
    pub keep_workspace: bool,
    pub skip_preflight: bool,
    pub dry_run: bool,
    pub log_level: LogLevel,
    pub teams_to_add: Vec<String>,
}

/// Raw, pre-validation inputs — one field per CLI/env flag (spec section 6).
pub struct RawRunConfig {
    pub source: String,
    pub destination: String,
    pub source_ref: Option<String>,
    pub destination_base: Option<String>,
    pub explicit_mappings: Vec<String>,
    pub source_subdir: Option<String>,
    pub dest_subdir: Option<String>,
    pub rev_list_paths: Vec<String>,
    pub rebase: RebaseOptions,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub coauthor_action: Option<CoauthorAction>,
    pub filter_backend: FilterBackendChoice,
    pub submit_pr: bool,
    pub create_if_missing: bool,
    pub keep_workspace: bool,
    pub skip_preflight: bool,
    pub dry_run: bool,
    pub log_level: LogLevel,
    pub teams_to_add: Vec<String>,
}

/// Characters that must never reach a subprocess argument unescaped;
/// rejecting them up front satisfies the injection-safety requirement in
/// spec section 7 without ever needing to shell-escape downstream.
const FORBIDDEN_IDENTITY_CHARS: &[char] = &['`', '\'', '"', '$', ';', '|', '&', '\n'];

fn validate_identity_field(value: &str, field: &str) -> Result<(), String> {
    if let Some(bad) = value.chars().find(|c| FORBIDDEN_IDENTITY_CHARS.contains(c)) {
        return Err(format!("{field} contains disallowed character `{bad}`"));
    }
    Ok(())
}

impl RunConfig {
    pub fn validate(raw: RawRunConfig) -> Result<Self, String> {
        let source = parse_repo_ref(&raw.source);
        let destination = parse_repo_ref(&raw.destination);

        let using_explicit = !raw.explicit_mappings.is_empty();
        let using_legacy = raw.source_subdir.is_some() || raw.dest_subdir.is_some();
        if using_explicit && using_legacy {
            return Err("-m cannot be combined with -d/-p; choose one mapping form".to_string());
        }

        let mappings = if using_explicit {
            mapping::parse_mappings(raw.explicit_mappings.iter().map(String::as_str))?
        } else {
            let source = mapping::normalize_path(raw.source_subdir.as_deref().unwrap_or(""));
            let destination = mapping::normalize_path(raw.dest_subdir.as_deref().unwrap_or(""));
            vec![PathMapping { source, destination }]
        };

        if mappings.is_empty() {
            return Err("at least one mapping is required".to_string());
        }

        if let Err((a, b)) = check_no_overlap(&mappings) {
            return Err(format!(
                "destination mappings overlap: `{a}` and `{b}` cannot both be used"
            ));
        }

        if mappings.iter().any(|m| m.destination.is_empty()) && mappings.len() > 1 {
            return Err(
                "a mapping with an empty (repo-root) destination must be the only mapping".to_string(),
            );
        }

        let author_override = build_identity(raw.author_name, raw.author_email, "author")?;
        let committer_override =
            build_identity(raw.committer_name, raw.committer_email, "committer")?;

        let coauthor_action = raw.coauthor_action.unwrap_or({
            if author_override.is_some() || committer_override.is_some() {
                CoauthorAction::Claude
            } else {
                CoauthorAction::Keep
            }
        });

        Ok(RunConfig {
            source,
            destination,
            source_ref: raw.source_ref,
            destination_base: raw.destination_base,
            mappings,
            rev_list_paths: raw.rev_list_paths,
            rebase: raw.rebase,
            author_override,
            committer_override,
            coauthor_action,
            filter_backend: raw.filter_backend,
            submit_pr: raw.submit_pr,
            create_if_missing: raw.create_if_missing,
            keep_workspace: raw.keep_workspace,
            skip_preflight: raw.skip_preflight,
            dry_run: raw.dry_run,
            log_level: raw.log_level,
            teams_to_add: raw.teams_to_add,
        })
    }

    pub fn is_multipath(&self) -> bool {
        self.mappings.len() > 1
    }

    pub fn local_source_path(&self) -> Option<&std::path::Path> {
        match &self.source {
            RepoRef::Local(path) => Some(path.as_path()),
            RepoRef::Remote(_) => None,
        }
    }
}

fn build_identity(
    name: Option<String>,
    email: Option<String>,
    role: &str,
) -> Result<Option<Identity>, String> {
    match (name, email) {
        (None, None) => Ok(None),
        (Some(name), Some(email)) => {
            validate_identity_field(&name, &format!("{role} name"))?;
            validate_identity_field(&email, &format!("{role} email"))?;
            Ok(Some(Identity { name, email }))
        }
        _ => Err(format!(
            "{role} override requires both name and email to be set"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_raw() -> RawRunConfig {
        RawRunConfig {
            source: "https://github.com/acme/mono.git".into(),
            destination: "https://github.com/acme/widgets.git".into(),
            source_ref: None,
            destination_base: None,
            explicit_mappings: vec![],
            source_subdir: Some("libs/widgets".into()),
            dest_subdir: None,
            rev_list_paths: vec![],
            rebase: RebaseOptions::default(),
            author_name: None,
            author_email: None,
            committer_name: None,
            committer_email: None,
            coauthor_action: None,
            filter_backend: FilterBackendChoice::Auto,
            submit_pr: false,
            create_if_missing: false,
            keep_workspace: false,
            skip_preflight: false,
            dry_run: false,
            log_level: LogLevel::Info,
            teams_to_add: vec![],
        }
    }

    #[test]
    fn legacy_subdir_folds_into_single_mapping() {
        let cfg = RunConfig::validate(base_raw()).unwrap();
        assert_eq!(cfg.mappings.len(), 1);
        assert_eq!(cfg.mappings[0].source, "libs/widgets");
        assert_eq!(cfg.mappings[0].destination, "");
    }

    #[test]
    fn rejects_combining_explicit_and_legacy_mapping_forms() {
        let mut raw = base_raw();
        raw.explicit_mappings.push("a:b".into());
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn rejects_overlapping_explicit_mappings() {
        let mut raw = base_raw();
        raw.source_subdir = None;
        raw.explicit_mappings = vec!["x:a/b".into(), "y:a".into()];
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn default_coauthor_action_is_claude_when_identity_overridden() {
        let mut raw = base_raw();
        raw.author_name = Some("Bot".into());
        raw.author_email = Some("bot@example.com".into());
        let cfg = RunConfig::validate(raw).unwrap();
        assert_eq!(cfg.coauthor_action, CoauthorAction::Claude);
    }

    #[test]
    fn default_coauthor_action_is_keep_without_identity_override() {
        let cfg = RunConfig::validate(base_raw()).unwrap();
        assert_eq!(cfg.coauthor_action, CoauthorAction::Keep);
    }

    #[test]
    fn rejects_half_specified_author_override() {
        let mut raw = base_raw();
        raw.author_name = Some("Bot".into());
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn rejects_identity_with_shell_metacharacters() {
        let mut raw = base_raw();
        raw.author_name = Some("`rm -rf /`".into());
        raw.author_email = Some("bot@example.com".into());
        assert!(RunConfig::validate(raw).is_err());
    }
}

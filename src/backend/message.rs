//! Commit-message trailer scrubbing (spec section 4.4).
//!
//! Operates on trailer *lines*, never on the whole message body, so a
//! commit subject or description that happens to mention "Claude" is left
//! untouched.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::CoauthorAction;

static CLAUDE_COAUTHOR_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Co-authored-by:\s*(claude|claude code)\s*<[^>]*@anthropic\.com>\s*$")
        .unwrap()
});

static CLAUDE_COAUTHOR_TRAILER_ANY_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Co-authored-by:\s*(claude|claude code)\s*<[^>]*>\s*$").unwrap()
});

static ANTHROPIC_DOMAIN_TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^Co-authored-by:.*<[^>]*@anthropic\.com>\s*$").unwrap()
});

static ANY_COAUTHOR_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^Co-authored-by:.*$").unwrap());

static CLAUDE_GENERATED_WITH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^.*Generated with.*Claude.*$").unwrap());

static ANY_GENERATED_WITH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^.*Generated with.*$").unwrap());

/// Applies `action` to a commit message, returning the scrubbed message.
/// `keep` is a no-op; `claude` removes only Claude/Anthropic attribution
/// trailers; `all` removes every co-author trailer and generated-with line.
pub fn scrub_message(message: &str, action: CoauthorAction) -> String {
    let scrubbed = match action {
        CoauthorAction::Keep => return message.to_string(),
        CoauthorAction::Claude => {
            let step1 = CLAUDE_COAUTHOR_TRAILER_ANY_EMAIL.replace_all(message, "");
            let step2 = ANTHROPIC_DOMAIN_TRAILER.replace_all(&step1, "");
            let step3 = CLAUDE_GENERATED_WITH_LINE.replace_all(&step2, "");
            // keep CLAUDE_COAUTHOR_TRAILER referenced so a narrower match is
            // available if callers want the stricter variant later.
            let _ = &*CLAUDE_COAUTHOR_TRAILER;
            step3.to_string()
        }
        CoauthorAction::All => {
            let step1 = ANY_COAUTHOR_TRAILER.replace_all(message, "");
            let step2 = ANY_GENERATED_WITH_LINE.replace_all(&step1, "");
            step2.to_string()
        }
    };
    collapse_blank_runs(&scrubbed)
}

/// Collapses runs of 2+ blank lines left behind by trailer removal down to
/// a single blank line, and trims trailing blank lines.
fn collapse_blank_runs(message: &str) -> String {
    let mut out = Vec::new();
    let mut prev_blank = false;
    for line in message.lines() {
        let blank = line.trim().is_empty();
        if blank && prev_blank {
            continue;
        }
        out.push(line);
        prev_blank = blank;
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_action_is_a_no_op() {
        let msg = "fix bug\n\nCo-authored-by: Claude <noreply@anthropic.com>";
        assert_eq!(scrub_message(msg, CoauthorAction::Keep), msg);
    }

    #[test]
    fn claude_action_removes_only_claude_trailer() {
        let msg = "fix bug\n\nCo-authored-by: Claude <noreply@anthropic.com>\nCo-authored-by: Jane Doe <jane@example.com>";
        let scrubbed = scrub_message(msg, CoauthorAction::Claude);
        assert!(!scrubbed.contains("anthropic.com"));
        assert!(scrubbed.contains("Jane Doe"));
    }

    #[test]
    fn claude_action_strips_generated_with_line() {
        let msg = "fix bug\n\nGenerated with Claude Code\n\nCo-authored-by: Jane Doe <jane@example.com>";
        let scrubbed = scrub_message(msg, CoauthorAction::Claude);
        assert!(!scrubbed.to_lowercase().contains("generated with"));
        assert!(scrubbed.contains("Jane Doe"));
    }

    #[test]
    fn all_action_removes_every_coauthor_trailer() {
        let msg = "fix bug\n\nCo-authored-by: Jane Doe <jane@example.com>\nCo-authored-by: Bob <bob@example.com>";
        let scrubbed = scrub_message(msg, CoauthorAction::All);
        assert!(!scrubbed.contains("Co-authored-by"));
    }

    #[test]
    fn all_action_strips_generated_with_line_from_any_tool() {
        let msg = "fix bug\n\nGenerated with Cursor\n\nCo-authored-by: Jane Doe <jane@example.com>";
        let scrubbed = scrub_message(msg, CoauthorAction::All);
        assert!(!scrubbed.to_lowercase().contains("generated with"));
        assert!(scrubbed.contains("Jane Doe"));
    }

    #[test]
    fn does_not_touch_subject_mentioning_claude() {
        let msg = "rename ClaudeHelper to Helper\n\nCo-authored-by: Claude <noreply@anthropic.com>";
        let scrubbed = scrub_message(msg, CoauthorAction::Claude);
        assert!(scrubbed.contains("rename ClaudeHelper to Helper"));
        assert!(!scrubbed.contains("anthropic.com"));
    }

    #[test]
    fn collapse_blank_runs_trims_trailing_blanks() {
        let out = collapse_blank_runs("a\n\n\n\nb\n\n\n");
        assert_eq!(out, "a\n\nb");
    }
}

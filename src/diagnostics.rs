//! Four-level, TTY-aware status output (spec section 4.8).
//!
//! Mirrors the teacher's `styling` module: emoji-prefixed, colorized lines
//! built with `color_print::cformat!`, re-exported through `anstream` so
//! color is stripped automatically when stdout is not a terminal.

use std::sync::atomic::{AtomicU8, Ordering};

pub use anstream::{eprintln, println};

/// The four levels named in spec section 4.8, in strict ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

static CONFIGURED_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn set_level(level: LogLevel) {
    CONFIGURED_LEVEL.store(level as u8, Ordering::Relaxed);
}

fn configured_level() -> LogLevel {
    match CONFIGURED_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Debug,
        1 => LogLevel::Info,
        2 => LogLevel::Warning,
        _ => LogLevel::Error,
    }
}

fn enabled(level: LogLevel) -> bool {
    level >= configured_level()
}

pub mod constants {
    //! Emoji and ANSI-tag constants, ported from the teacher's
    //! `styling::constants` module.

    pub const DEBUG_EMOJI: &str = "🔍";
    pub const PROGRESS_EMOJI: &str = "⏳";
    pub const SUCCESS_EMOJI: &str = "✅";
    pub const ERROR_EMOJI: &str = "❌";
    pub const WARNING_EMOJI: &str = "⚠️";
    pub const HINT_EMOJI: &str = "💡";
    pub const INFO_EMOJI: &str = "ℹ️";

    pub const ERROR_BOLD: &str = "\u{1b}[1;31m";
    pub const HINT: &str = "\u{1b}[2m";
    pub const RESET: &str = "\u{1b}[0m";
}

use constants::*;

fn render(prefix: &str, tag: &str, msg: &str) -> String {
    color_print::cformat!("{prefix} <{tag}>{}</>", msg)
}

pub fn debug(msg: impl AsRef<str>) {
    if enabled(LogLevel::Debug) {
        eprintln!("{}", render(DEBUG_EMOJI, "dim", msg.as_ref()));
    }
    log::debug!("{}", msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    if enabled(LogLevel::Info) {
        println!("{}", color_print::cformat!("{} {}", INFO_EMOJI, msg.as_ref()));
    }
    log::info!("{}", msg.as_ref());
}

pub fn warning(msg: impl AsRef<str>) {
    if enabled(LogLevel::Warning) {
        eprintln!("{}", render(WARNING_EMOJI, "yellow", msg.as_ref()));
    }
    log::warn!("{}", msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    // error is always emitted regardless of configured level.
    eprintln!("{}", render(ERROR_EMOJI, "red", msg.as_ref()));
    log::error!("{}", msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    if enabled(LogLevel::Info) {
        println!("{}", render(SUCCESS_EMOJI, "green", msg.as_ref()));
    }
    log::info!("{}", msg.as_ref());
}

pub fn hint(msg: impl AsRef<str>) {
    if enabled(LogLevel::Info) {
        println!("{}", render(HINT_EMOJI, "dim", msg.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_strictly_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn error_always_enabled_regardless_of_configured_level() {
        set_level(LogLevel::Error);
        assert!(enabled(LogLevel::Error));
        set_level(LogLevel::Debug);
        assert!(enabled(LogLevel::Error));
    }

    #[test]
    fn raising_configured_level_disables_lower_levels() {
        set_level(LogLevel::Warning);
        assert!(!enabled(LogLevel::Info));
        assert!(enabled(LogLevel::Warning));
        set_level(LogLevel::Info);
    }
}

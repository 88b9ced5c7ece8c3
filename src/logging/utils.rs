//! Log file location, ANSI stripping, and timestamps.
use std::fs;
use std::path::PathBuf;

/// Environment variable naming the directory for log files.
pub const LOG_DIR_ENV: &str = "KERNEL_SETTINGS_LOG_DIR";

/// Remove CSI escape sequences (colors, cursor movement) from `s`.
///
/// A lone `ESC` followed by anything other than `[` is dropped together with
/// that character.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if in_escape {
            if ('@'..='~').contains(&c) {
                in_escape = false;
            }
            continue;
        }
        if c != '\x1b' {
            out.push(c);
        } else if chars.next_if_eq(&'[').is_some() {
            in_escape = true;
        } else {
            chars.next();
        }
    }
    out
}

/// Directory holding per-command log files, created on demand.
///
/// `KERNEL_SETTINGS_LOG_DIR` wins; otherwise `$XDG_CACHE_HOME/kernel-settings`
/// with `$HOME/.cache` as the fallback cache root.
pub(super) fn log_dir() -> Option<PathBuf> {
    let dir = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?
            .join("kernel-settings"),
    };
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}

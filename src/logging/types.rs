//! The [`Log`] seam passed to everything that reports progress.

/// Sink for progress messages.
///
/// Merge, store and discovery code only ever see a `&dyn Log`, so they run
/// the same under the real [`Logger`](super::Logger) and under a test double.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Start of a major step, such as reading the document.
    fn stage(&self, msg: &str);
    /// Normal progress.
    fn info(&self, msg: &str);
    /// Detail that only shows on the console with `--verbose`.
    fn debug(&self, msg: &str);
    /// Something odd that does not stop the run.
    fn warn(&self, msg: &str);
    /// A failure, usually followed by a non-zero exit.
    fn error(&self, msg: &str);
    /// A write that was skipped because of `--dry-run`.
    fn dry_run(&self, msg: &str);
}

//! [`Log`] implementation that emits [`tracing`] events.
use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::Log;

/// Logger tagging every event with the running subcommand.
///
/// Where the events end up is decided by the subscriber installed with
/// [`init_subscriber`](super::init_subscriber).
#[derive(Debug, Clone)]
pub struct Logger {
    command: &'static str,
}

impl Logger {
    #[must_use]
    pub const fn new(command: &'static str) -> Self {
        Self { command }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, command = self.command, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(command = self.command, "{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(command = self.command, "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(command = self.command, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(command = self.command, "{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, command = self.command, "{msg}");
    }
}

//! Subscriber wiring: a console layer on stderr and a plain-text file layer.
use std::fmt::Write as _;
use std::fs;
use std::io::{IsTerminal as _, Write as _};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};

use super::utils::{log_dir, strip_ansi, utc_now};

pub(super) const STAGE_TARGET: &str = "kernel_settings::stage";
pub(super) const DRY_RUN_TARGET: &str = "kernel_settings::dry_run";

/// The fields of an event this crate cares about.
#[derive(Default)]
struct Fields {
    message: String,
    command: Option<String>,
}

impl Fields {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "command" => self.command = Some(format!("{value:?}")),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "command" => self.command = Some(value.to_string()),
            _ => {}
        }
    }
}

/// How an event is labelled, independent of where it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Info,
    Debug,
    Warn,
    Error,
}

impl Kind {
    fn of(metadata: &tracing::Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    const fn plain_tag(self) -> &'static str {
        match self {
            Self::Stage => "==> ",
            Self::DryRun => "[dry run] ",
            Self::Info => "",
            Self::Debug => "[debug] ",
            Self::Warn => "[warn] ",
            Self::Error => "[error] ",
        }
    }
}

/// Layer appending every event to a log file as
/// `[HH:MM:SS] <command>: <tag><message>`.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the default log file for `command` inside the log directory.
    pub(super) fn for_command(command: &str) -> Option<Self> {
        let path = log_dir()?.join(format!("{command}.log"));
        Self::create(&path, command)
    }

    /// Truncate `path`, write a run header, and keep it open for appending.
    pub(super) fn create(path: &Path, command: &str) -> Option<Self> {
        let version = option_env!("KERNEL_SETTINGS_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "# kernel-settings {version} {command}\n# started {} UTC\n",
            utc_now("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let fields = Fields::of(event);
        let mut line = format!("[{}] ", utc_now("%H:%M:%S"));
        if let Some(command) = &fields.command {
            let _ = write!(line, "{command}: ");
        }
        line.push_str(Kind::of(event.metadata()).plain_tag());
        line.push_str(&strip_ansi(&fields.message));

        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Human-facing console format; colors only when stderr is a terminal.
struct ConsoleFormatter {
    color: bool,
}

impl ConsoleFormatter {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let msg = Fields::of(event).message;
        match Kind::of(event.metadata()) {
            Kind::Error => writeln!(writer, "{} {msg}", self.paint("31", "error:")),
            Kind::Warn => writeln!(writer, "{} {msg}", self.paint("33", "warning:")),
            Kind::Stage => writeln!(writer, "{} {}", self.paint("1;34", "==>"), self.paint("1", &msg)),
            Kind::DryRun => writeln!(writer, "  {} {msg}", self.paint("33", "[dry run]")),
            Kind::Info => writeln!(writer, "  {msg}"),
            Kind::Debug => writeln!(writer, "  {}", self.paint("2", &msg)),
        }
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// Console output goes to stderr so stdout only ever carries JSON results.
/// `RUST_LOG` adjusts the console level, which otherwise defaults to `info`
/// (`debug` when `verbose`). The log file always records `debug` and up.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console = fmt::layer()
        .event_format(ConsoleFormatter {
            color: std::io::stderr().is_terminal(),
        })
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        );
    let file = FileLayer::for_command(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}

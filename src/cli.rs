use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::document::{Format, STDIN_PATH};
use crate::config::settings::SettingsOverrides;

/// Top-level CLI entry point for the kernel settings engine.
#[derive(Parser, Debug)]
#[command(
    name = "kernel-settings",
    about = "Declarative, idempotent kernel settings for tuned profiles",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Engine settings file (TOML)
    #[arg(short, long, global = true, env = "KERNEL_SETTINGS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the tuned configuration directory
    #[arg(long, global = true)]
    pub tuned_dir: Option<PathBuf>,

    /// Override the managed profile name
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Preview changes without writing anything
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

impl GlobalOpts {
    /// Flag values that take precedence over the settings file.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            profile_name: self.profile.clone(),
            tuned_dir: self.tuned_dir.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a desired-state document into the managed profile
    Apply(ApplyOpts),
    /// Check a desired-state document without touching any profile
    Validate(DocumentOpts),
    /// Print an INI file as JSON
    Show(ShowOpts),
    /// Report current kernel settings of this system
    Report(ReportOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Subcommand name, used to name the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Apply(_) => "apply",
            Self::Validate(_) => "validate",
            Self::Show(_) => "show",
            Self::Report(_) => "report",
            Self::Version => "version",
        }
    }
}

/// Where to read a desired-state document from.
#[derive(Args, Debug, Clone)]
pub struct DocumentOpts {
    /// Document path, or `-` for stdin
    #[arg(default_value = STDIN_PATH)]
    pub document: PathBuf,

    /// Document format (default: from the file extension, else YAML)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,
}

/// Options for the `apply` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ApplyOpts {
    #[command(flatten)]
    pub document: DocumentOpts,

    /// Delete every section the document does not mention
    #[arg(long)]
    pub purge: bool,
}

/// Options for the `show` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ShowOpts {
    /// INI file to print
    pub path: PathBuf,
}

/// Options for the `report` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ReportOpts {
    /// Directory that system paths are resolved under
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Print a desired-state document instead of the raw report
    #[arg(long)]
    pub as_document: bool,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn apply_opts(args: &[&str]) -> ApplyOpts {
        match Cli::parse_from(args).command {
            Command::Apply(opts) => Some(opts),
            _ => None,
        }
        .expect("expected apply command")
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply_with_document() {
        let opts = apply_opts(&["kernel-settings", "apply", "settings.yml"]);
        assert_eq!(opts.document.document, PathBuf::from("settings.yml"));
        assert_eq!(opts.document.format, None);
        assert!(!opts.purge);
    }

    #[test]
    fn parse_apply_defaults_to_stdin() {
        let opts = apply_opts(&["kernel-settings", "apply", "--purge"]);
        assert_eq!(opts.document.document, PathBuf::from("-"));
        assert!(opts.purge);
    }

    #[test]
    fn parse_apply_with_format() {
        let opts = apply_opts(&["kernel-settings", "apply", "-f", "json", "-"]);
        assert_eq!(opts.document.format, Some(Format::Json));
    }

    #[test]
    fn parse_global_overrides() {
        let cli = Cli::parse_from([
            "kernel-settings",
            "--tuned-dir",
            "/tmp/tuned",
            "-p",
            "custom",
            "validate",
            "x.yml",
        ]);
        let overrides = cli.global.overrides();
        assert_eq!(overrides.tuned_dir, Some(PathBuf::from("/tmp/tuned")));
        assert_eq!(overrides.profile_name.as_deref(), Some("custom"));
        assert!(matches!(cli.command, Command::Validate(_)));
        assert_eq!(cli.command.name(), "validate");
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["kernel-settings", "-d", "apply", "x.yml"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["kernel-settings", "report", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_report_defaults() {
        let opts = match Cli::parse_from(["kernel-settings", "report"]).command {
            Command::Report(opts) => Some(opts),
            _ => None,
        }
        .expect("expected report command");
        assert_eq!(opts.root, PathBuf::from("/"));
        assert!(!opts.as_document);
    }

    #[test]
    fn parse_show_requires_path() {
        assert!(Cli::try_parse_from(["kernel-settings", "show"]).is_err());
        let cli = Cli::parse_from(["kernel-settings", "show", "/etc/tuned/x/tuned.conf"]);
        assert!(matches!(cli.command, Command::Show(_)));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["kernel-settings", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }
}

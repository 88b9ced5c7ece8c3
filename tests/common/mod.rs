// Shared helpers for integration tests.
//
// Provides a temporary tuned directory and a fluent builder so each
// integration test can set up an isolated profile tree without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use kernel_settings::commands::apply::{ApplyReport, Applier};
use kernel_settings::config::document::{self, Format};
use kernel_settings::config::settings::{PROFILE_FILE, Settings};
use kernel_settings::error::KernelSettingsError;
use kernel_settings::logging::Log;
use kernel_settings::profile::activation::{
    ACTIVE_PROFILE_FILE, ActivationRegistry, MANUAL_MODE, PROFILE_MODE_FILE,
};
use kernel_settings::profile::store::FileProfileStore;

/// A [`Log`] that discards everything.
#[derive(Debug, Default)]
pub struct NullLog;

impl Log for NullLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, _msg: &str) {}
}

/// An isolated tuned directory backed by a [`tempfile::TempDir`].
pub struct TunedContext {
    /// Temporary directory standing in for `/etc/tuned`.
    pub dir: tempfile::TempDir,
    /// Settings pointing at `dir`.
    pub settings: Settings,
}

impl TunedContext {
    /// Create an empty tuned directory with default settings.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let settings = Settings {
            tuned_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        Self { dir, settings }
    }

    /// Path to the tuned directory.
    pub fn tuned_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the managed profile file.
    pub fn profile_path(&self) -> PathBuf {
        self.settings.profile_path()
    }

    /// Contents of the managed profile file.
    pub fn profile_text(&self) -> String {
        std::fs::read_to_string(self.profile_path()).expect("read profile")
    }

    /// Contents of a registry file, empty if missing.
    pub fn registry_file(&self, file: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(file)).unwrap_or_default()
    }

    /// Parse `yaml` and apply it.
    pub fn apply_yaml(&self, yaml: &str) -> Result<ApplyReport, KernelSettingsError> {
        self.apply(yaml, Format::Yaml, false, false)
    }

    /// Parse `content` and apply it with the given flags.
    pub fn apply(
        &self,
        content: &str,
        format: Format,
        purge: bool,
        dry_run: bool,
    ) -> Result<ApplyReport, KernelSettingsError> {
        let value = document::parse(content, format)?;
        let store = FileProfileStore::new(&self.settings.tuned_dir, &self.settings.profile_name);
        let registry = ActivationRegistry::new(&self.settings.tuned_dir);
        Applier::new(&self.settings, &store, &registry, &NullLog, dry_run).apply(&value, purge)
    }
}

/// Fluent builder for [`TunedContext`].
pub struct TunedContextBuilder {
    ctx: TunedContext,
}

impl TunedContextBuilder {
    /// Begin building a context backed by an empty tuned directory.
    pub fn new() -> Self {
        Self {
            ctx: TunedContext::new(),
        }
    }

    /// Write `content` as the `tuned.conf` of profile `name`.
    pub fn with_profile(self, name: &str, content: &str) -> Self {
        let dir = self.ctx.dir.path().join(name);
        std::fs::create_dir_all(&dir).expect("create profile dir");
        std::fs::write(dir.join(PROFILE_FILE), content).expect("write profile");
        self
    }

    /// Write the activation registry.
    pub fn with_active_profile(self, active: &str, mode: &str) -> Self {
        std::fs::write(
            self.ctx.dir.path().join(ACTIVE_PROFILE_FILE),
            format!("{active}\n"),
        )
        .expect("write active_profile");
        std::fs::write(
            self.ctx.dir.path().join(PROFILE_MODE_FILE),
            format!("{mode}\n"),
        )
        .expect("write profile_mode");
        self
    }

    /// Mark the default managed profile as active in manual mode.
    pub fn activated(self) -> Self {
        let name = self.ctx.settings.profile_name.clone();
        self.with_active_profile(&name, MANUAL_MODE)
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> TunedContext {
        self.ctx
    }
}

//! Per-invocation engine settings.
//!
//! Settings are read from an optional TOML file and then overridden by
//! command-line flags. Every field has a default, so running without a
//! settings file manages `/etc/tuned/kernel_settings/tuned.conf`.
//!
//! ```toml
//! profile_name = "kernel_settings"
//! tuned_dir = "/etc/tuned"
//! summary = "kernel settings"
//! restart_sections = ["bootloader"]
//!
//! [command_line]
//! section = "bootloader"
//! option = "cmdline"
//! ```
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::toml_loader;
use crate::error::SettingsError;

/// Default managed profile name.
pub const DEFAULT_PROFILE_NAME: &str = "kernel_settings";

/// Default tuned configuration directory.
pub const DEFAULT_TUNED_DIR: &str = "/etc/tuned";

/// Default `[main] summary` of a freshly created profile.
pub const DEFAULT_SUMMARY: &str = "kernel settings";

/// File name of a profile inside its directory.
pub const PROFILE_FILE: &str = "tuned.conf";

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name of the managed profile.
    pub profile_name: String,
    /// Directory holding profiles and the activation registry.
    pub tuned_dir: PathBuf,
    /// Summary written to `[main]` when the profile is created.
    pub summary: String,
    /// Sections whose changes only take effect after a reboot.
    pub restart_sections: Vec<String>,
    /// Location of the token-structured command-line field.
    pub command_line: CommandLineField,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile_name: DEFAULT_PROFILE_NAME.to_string(),
            tuned_dir: PathBuf::from(DEFAULT_TUNED_DIR),
            summary: DEFAULT_SUMMARY.to_string(),
            restart_sections: vec!["bootloader".to_string()],
            command_line: CommandLineField::default(),
        }
    }
}

/// The one option whose value is a shell-style token list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandLineField {
    /// Section holding the field.
    pub section: String,
    /// Option name of the field.
    pub option: String,
}

impl Default for CommandLineField {
    fn default() -> Self {
        Self {
            section: "bootloader".to_string(),
            option: "cmdline".to_string(),
        }
    }
}

impl CommandLineField {
    /// Return `true` if `section`/`option` names this field.
    #[must_use]
    pub fn matches(&self, section: &str, option: &str) -> bool {
        self.section == section && self.option == option
    }
}

/// Flag values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub profile_name: Option<String>,
    pub tuned_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path` (defaults when `None` or missing) and apply
    /// flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => toml_loader::load_config(path)?,
            None => Self::default(),
        };
        if let Some(name) = &overrides.profile_name {
            settings.profile_name.clone_from(name);
        }
        if let Some(dir) = &overrides.tuned_dir {
            settings.tuned_dir.clone_from(dir);
        }
        Ok(settings)
    }

    /// Directory holding the managed profile.
    #[must_use]
    pub fn profile_dir(&self) -> PathBuf {
        self.tuned_dir.join(&self.profile_name)
    }

    /// Path of the managed profile file.
    #[must_use]
    pub fn profile_path(&self) -> PathBuf {
        self.profile_dir().join(PROFILE_FILE)
    }
}

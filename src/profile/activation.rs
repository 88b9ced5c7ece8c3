//! tuned's record of which profiles are active.
//!
//! tuned reads `<tuned_dir>/active_profile` (a space-separated list, applied
//! left to right) and `<tuned_dir>/profile_mode` (`manual` or `auto`). The
//! managed profile must come last in the list and the mode must be `manual`,
//! or tuned may pick a different profile on its own.
use std::path::PathBuf;

use super::store::write_atomic;
use crate::error::ProfileError;

/// File holding the active profile list.
pub const ACTIVE_PROFILE_FILE: &str = "active_profile";

/// File holding the profile selection mode.
pub const PROFILE_MODE_FILE: &str = "profile_mode";

/// Profile mode that stops tuned from choosing profiles automatically.
pub const MANUAL_MODE: &str = "manual";

/// The registry contents planned by [`ActivationRegistry::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Active profiles in application order.
    pub profiles: Vec<String>,
    /// The registry had to be updated.
    pub changed: bool,
}

impl Activation {
    /// The list as tuned stores it.
    #[must_use]
    pub fn active_profile(&self) -> String {
        self.profiles.join(" ")
    }
}

/// Reads and updates the registry files in a tuned directory.
#[derive(Debug, Clone)]
pub struct ActivationRegistry {
    tuned_dir: PathBuf,
}

impl ActivationRegistry {
    #[must_use]
    pub fn new(tuned_dir: impl Into<PathBuf>) -> Self {
        Self {
            tuned_dir: tuned_dir.into(),
        }
    }

    /// Work out what the registry must hold for `profile` to be active in
    /// manual mode. Nothing is written.
    ///
    /// An existing entry keeps its position; a missing one is appended.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Registry`] if a registry file cannot be read.
    pub fn plan(&self, profile: &str) -> Result<Activation, ProfileError> {
        let mut profiles: Vec<String> = self
            .read(ACTIVE_PROFILE_FILE)?
            .split_whitespace()
            .map(String::from)
            .collect();
        let manual = self.read(PROFILE_MODE_FILE)?.trim() == MANUAL_MODE;

        let mut changed = !manual;
        if !profiles.iter().any(|p| p == profile) {
            profiles.push(profile.to_string());
            changed = true;
        }
        Ok(Activation { profiles, changed })
    }

    /// Write a planned activation; an unchanged one is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Registry`] if a registry file cannot be written.
    pub fn commit(&self, activation: &Activation) -> Result<(), ProfileError> {
        if !activation.changed {
            return Ok(());
        }
        self.write(
            ACTIVE_PROFILE_FILE,
            &format!("{}\n", activation.active_profile()),
        )?;
        self.write(PROFILE_MODE_FILE, &format!("{MANUAL_MODE}\n"))
    }

    /// Read a registry file; a missing file reads as empty.
    fn read(&self, file: &str) -> Result<String, ProfileError> {
        let path = self.tuned_dir.join(file);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(ProfileError::Registry { path, source }),
        }
    }

    fn write(&self, file: &str, content: &str) -> Result<(), ProfileError> {
        let path = self.tuned_dir.join(file);
        write_atomic(&path, content).map_err(|source| ProfileError::Registry { path, source })
    }
}

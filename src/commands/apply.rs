//! Command: merge a desired-state document into the managed profile.
use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::cli::{ApplyOpts, GlobalOpts};
use crate::config::document;
use crate::config::settings::Settings;
use crate::config::validation::DocumentValidator;
use crate::error::{DocumentError, KernelSettingsError};
use crate::logging::Log;
use crate::profile::activation::ActivationRegistry;
use crate::profile::merge::{MergePolicy, ProfileMerger};
use crate::profile::store::{FileProfileStore, ProfileStore, load_managed};
use crate::profile::{Profile, Section};

/// Message when the profile content changed.
pub const UPDATED_MSG: &str = "Kernel settings were updated.";

/// Message when nothing changed.
pub const UP_TO_DATE_MSG: &str = "Kernel settings are up to date.";

/// Message when only the activation registry changed.
pub const ACTIVATION_MSG: &str = "Updated active profile and/or mode.";

/// Appended to the message when a reboot is required.
pub const REBOOT_MSG: &str = "  A system reboot is needed to apply the changes.";

/// Result of one `apply` run, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub changed: bool,
    pub restart_required: bool,
    pub msg: String,
    /// Structural problems in the document; empty on success.
    pub diagnostics: Vec<String>,
    /// Sections of the profile after the merge.
    pub new_profile: IndexMap<String, Section>,
    /// tuned's active profile list after the run.
    pub active_profile: String,
}

impl ApplyReport {
    /// Report for a document that failed validation.
    #[must_use]
    pub fn invalid(error: &DocumentError, diagnostics: Vec<String>) -> Self {
        Self {
            changed: false,
            restart_required: false,
            msg: error.to_string(),
            diagnostics,
            new_profile: IndexMap::new(),
            active_profile: String::new(),
        }
    }
}

/// Runs validation, merge, persistence and activation for one document.
pub struct Applier<'a> {
    settings: &'a Settings,
    store: &'a dyn ProfileStore,
    registry: &'a ActivationRegistry,
    log: &'a dyn Log,
    dry_run: bool,
}

impl fmt::Debug for Applier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Applier")
            .field("settings", self.settings)
            .field("registry", self.registry)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl<'a> Applier<'a> {
    #[must_use]
    pub const fn new(
        settings: &'a Settings,
        store: &'a dyn ProfileStore,
        registry: &'a ActivationRegistry,
        log: &'a dyn Log,
        dry_run: bool,
    ) -> Self {
        Self {
            settings,
            store,
            registry,
            log,
            dry_run,
        }
    }

    /// Apply `document` to the managed profile.
    ///
    /// `purge` forces purge semantics on top of the document's own `purge`
    /// key. Nothing is written if the document is invalid, if the merge
    /// fails, or in dry-run mode. The profile is saved before the registry
    /// is updated.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Invalid`] with every diagnostic if the
    /// document is malformed, and profile or merge errors otherwise.
    pub fn apply(&self, document: &Value, purge: bool) -> Result<ApplyReport, KernelSettingsError> {
        let mut desired = DocumentValidator::new(&self.settings.command_line)
            .validate(document)
            .into_result()
            .map_err(DocumentError::Invalid)?;
        desired.purge |= purge;
        if desired.is_empty() {
            self.log.debug("document names no sections");
        }

        let mut profile = load_managed(self.store, &self.settings.summary, self.log)?;
        let policy = MergePolicy::from(self.settings);
        let merged = ProfileMerger::new(&policy, self.log).merge(&desired, &mut profile)?;
        let activation = self.registry.plan(&profile.name)?;

        let changed = merged.changed || activation.changed;
        let mut msg = if merged.changed {
            UPDATED_MSG
        } else if activation.changed {
            ACTIVATION_MSG
        } else {
            UP_TO_DATE_MSG
        }
        .to_string();

        if changed {
            self.persist(&profile, activation.changed)?;
            if !self.dry_run {
                self.registry.commit(&activation)?;
            }
        }
        if merged.restart_required {
            msg.push_str(REBOOT_MSG);
        }

        Ok(ApplyReport {
            changed,
            restart_required: merged.restart_required,
            msg,
            diagnostics: Vec::new(),
            new_profile: profile.sections,
            active_profile: activation.active_profile(),
        })
    }

    fn persist(&self, profile: &Profile, activation_changed: bool) -> Result<(), KernelSettingsError> {
        if self.dry_run {
            self.log
                .dry_run(&format!("would write profile [{}]", profile.name));
            if activation_changed {
                self.log.dry_run(&format!(
                    "would activate [{}] in manual mode",
                    profile.name
                ));
            }
            return Ok(());
        }
        self.store.save(profile)?;
        self.log.info(&format!("profile [{}] written", profile.name));
        if activation_changed {
            self.log
                .info(&format!("profile [{}] activated in manual mode", profile.name));
        }
        Ok(())
    }
}

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if the document cannot be read or is invalid, or if the
/// profile cannot be loaded, merged, or written.
pub fn run(global: &GlobalOpts, opts: &ApplyOpts, log: &dyn Log) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let settings = &setup.settings;

    log.stage("Reading document");
    let document = document::load(&opts.document.document, opts.document.format)?;

    log.stage("Merging profile");
    let store = FileProfileStore::new(&settings.tuned_dir, &settings.profile_name);
    let registry = ActivationRegistry::new(&settings.tuned_dir);
    let applier = Applier::new(settings, &store, &registry, log, global.dry_run);
    match applier.apply(&document, opts.purge) {
        Ok(report) => {
            log.info(&report.msg);
            super::print_json(&report)
        }
        Err(KernelSettingsError::Document(DocumentError::Invalid(diagnostics))) => {
            for diagnostic in &diagnostics {
                log.error(diagnostic);
            }
            let error = DocumentError::Invalid(diagnostics.clone());
            super::print_json(&ApplyReport::invalid(&error, diagnostics))?;
            Err(error.into())
        }
        Err(e) => Err(e.into()),
    }
}

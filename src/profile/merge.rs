//! Folding a validated desired state into a profile.
//!
//! [`merge_section`] applies one section directive; [`ProfileMerger`] runs it
//! for every section of a [`DesiredState`], applies purge semantics, and
//! prunes sections left empty. Both report a [`MergeOutcome`].
use std::ops::{BitOr, BitOrAssign};

use indexmap::IndexMap;

use super::Profile;
use super::cmdline::CommandLine;
use crate::config::desired::{DesiredState, Item, SectionDirective, TokenOp};
use crate::config::settings::Settings;
use crate::error::MergeError;
use crate::logging::Log;

/// Whether a merge changed anything, and whether the change needs a reboot.
///
/// Outcomes combine with `|`: a run changed if any section changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub changed: bool,
    pub restart_required: bool,
}

impl MergeOutcome {
    pub const UNCHANGED: Self = Self {
        changed: false,
        restart_required: false,
    };
}

impl BitOr for MergeOutcome {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            changed: self.changed || rhs.changed,
            restart_required: self.restart_required || rhs.restart_required,
        }
    }
}

impl BitOrAssign for MergeOutcome {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Which sections need a reboot when they change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    pub restart_sections: Vec<String>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for MergePolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            restart_sections: settings.restart_sections.clone(),
        }
    }
}

impl MergePolicy {
    /// Outcome for `section` given whether it changed.
    #[must_use]
    pub fn outcome(&self, section: &str, changed: bool) -> MergeOutcome {
        MergeOutcome {
            changed,
            restart_required: changed && self.restart_sections.iter().any(|s| s == section),
        }
    }
}

/// Apply one section's directive to `profile`.
///
/// The section's options are cleared first when the directive carries a
/// replace marker, when `purge` is set, or when the directive is
/// [`SectionDirective::Clear`]. Change detection compares the final options
/// with the ones before the merge, ignoring order.
///
/// An emptied section is left in place; [`ProfileMerger`] prunes it.
///
/// # Errors
///
/// Returns [`MergeError::CommandLine`] if the existing command-line value
/// cannot be tokenized.
pub fn merge_section(
    section: &str,
    directive: &SectionDirective,
    profile: &mut Profile,
    purge: bool,
    policy: &MergePolicy,
) -> Result<MergeOutcome, MergeError> {
    let (replace, items) = match directive {
        SectionDirective::Clear => {
            let changed = profile
                .sections
                .shift_remove(section)
                .is_some_and(|s| !s.is_empty());
            return Ok(policy.outcome(section, changed));
        }
        SectionDirective::Items { replace, items } => (*replace, items),
    };

    let options = &mut profile
        .sections
        .entry(section.to_string())
        .or_default()
        .options;
    let before = options.clone();
    if replace || purge {
        options.clear();
    }

    for item in items {
        match item {
            Item::Assign { name, value } => {
                options.insert(name.clone(), value.clone());
            }
            Item::Remove { name } => {
                options.shift_remove(name);
            }
            Item::CommandLine {
                name,
                replace,
                tokens,
            } => apply_command_line(section, name, *replace, tokens, options)?,
        }
    }

    Ok(policy.outcome(section, *options != before))
}

/// Run token operations against the command-line option `name`.
///
/// The option is deleted when no tokens remain.
fn apply_command_line(
    section: &str,
    name: &str,
    replace: bool,
    tokens: &[TokenOp],
    options: &mut IndexMap<String, String>,
) -> Result<(), MergeError> {
    let mut cmdline = match options.get(name) {
        Some(current) if !replace => {
            CommandLine::parse(current).map_err(|_| MergeError::CommandLine {
                section: section.to_string(),
                option: name.to_string(),
                value: current.clone(),
            })?
        }
        _ => CommandLine::default(),
    };

    for token in tokens {
        match token {
            TokenOp::Add { name, value } => cmdline.add(name, value.clone()),
            TokenOp::Remove { name } => cmdline.remove(name),
        }
    }

    if cmdline.is_empty() {
        options.shift_remove(name);
    } else {
        options.insert(name.to_string(), cmdline.to_string());
    }
    Ok(())
}

/// Merges a whole [`DesiredState`] into a profile.
#[derive(Debug)]
pub struct ProfileMerger<'a> {
    policy: &'a MergePolicy,
    log: &'a dyn Log,
}

impl<'a> ProfileMerger<'a> {
    #[must_use]
    pub const fn new(policy: &'a MergePolicy, log: &'a dyn Log) -> Self {
        Self { policy, log }
    }

    /// Merge `desired` into `profile` in place.
    ///
    /// Sections are merged in document order. With purge on, every existing
    /// section the document does not name is deleted. Sections left without
    /// options are pruned.
    ///
    /// # Errors
    ///
    /// Returns an error if a section cannot be merged; `profile` may then be
    /// partially updated and must not be saved.
    pub fn merge(
        &self,
        desired: &DesiredState,
        profile: &mut Profile,
    ) -> Result<MergeOutcome, MergeError> {
        let mut outcome = MergeOutcome::UNCHANGED;
        let mut purge_targets: Vec<String> = if desired.purge {
            profile.sections.keys().cloned().collect()
        } else {
            Vec::new()
        };

        for (section, directive) in &desired.sections {
            let section_outcome =
                merge_section(section, directive, profile, desired.purge, self.policy)?;
            self.report(section, section_outcome);
            purge_targets.retain(|s| s != section);
            outcome |= section_outcome;
        }

        for section in purge_targets {
            if let Some(removed) = profile.sections.shift_remove(&section) {
                let section_outcome = self.policy.outcome(&section, !removed.is_empty());
                self.log.info(&format!("section [{section}] purged"));
                outcome |= section_outcome;
            }
        }

        profile.prune_empty_sections();
        Ok(outcome)
    }

    fn report(&self, section: &str, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome {
                changed: true,
                restart_required: true,
            } => self
                .log
                .info(&format!("section [{section}] changed (reboot required)")),
            MergeOutcome { changed: true, .. } => {
                self.log.info(&format!("section [{section}] changed"));
            }
            MergeOutcome { .. } => self.log.debug(&format!("section [{section}] unchanged")),
        }
    }
}

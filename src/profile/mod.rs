//! The managed tuned profile and the engine that edits it.
//!
//! A [`Profile`] is a flat `[main]` option map plus an ordered map of named
//! [`Section`]s. Profiles are loaded and saved through a
//! [`ProfileStore`](store::ProfileStore); the
//! [`ProfileMerger`](merge::ProfileMerger) folds a validated
//! [`DesiredState`](crate::config::desired::DesiredState) into one.
pub mod activation;
pub mod cmdline;
pub mod merge;
pub mod store;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::ini::{self, KvDocument};
use crate::config::validation::MAIN_SECTION;
use crate::error::ProfileError;

/// Header comment written at the top of every managed profile.
pub const MANAGED_COMMENT: &str = "File managed by kernel-settings - DO NOT EDIT";

/// Option of `[main]` that every profile must carry.
pub const SUMMARY_OPTION: &str = "summary";

/// One named section of a profile: an ordered map of option name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Section {
    pub options: IndexMap<String, String>,
}

impl Section {
    #[must_use]
    pub fn get(&self, option: &str) -> Option<&str> {
        self.options.get(option).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A tuned profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile name (its directory name).
    pub name: String,
    /// `[main]` options; always has a `summary`.
    pub options: IndexMap<String, String>,
    /// Named sections in file order.
    pub sections: IndexMap<String, Section>,
}

impl Profile {
    /// Create an empty profile with the given summary.
    #[must_use]
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        let mut options = IndexMap::new();
        options.insert(SUMMARY_OPTION.to_string(), summary.into());
        Self {
            name: name.into(),
            options,
            sections: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Look up one option value.
    #[must_use]
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(option))
    }

    /// Drop sections that hold no options.
    pub fn prune_empty_sections(&mut self) {
        self.sections.retain(|_, section| !section.is_empty());
    }

    /// Build a profile from a parsed INI file.
    ///
    /// Repeated section headers are merged, later entries winning.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Malformed`] if there are entries outside any
    /// section or `[main]` has no `summary`.
    pub fn from_kv(name: &str, document: KvDocument) -> Result<Self, ProfileError> {
        let malformed = |reason: String| ProfileError::Malformed {
            name: name.to_string(),
            reason,
        };
        if let Some((key, _)) = document.defaults.first() {
            return Err(malformed(format!("option [{key}] is outside of any section")));
        }

        let mut options = IndexMap::new();
        let mut sections: IndexMap<String, Section> = IndexMap::new();
        for kv in document.sections {
            if kv.header == MAIN_SECTION {
                options.extend(kv.entries);
            } else {
                sections
                    .entry(kv.header)
                    .or_default()
                    .options
                    .extend(kv.entries);
            }
        }
        if !options.contains_key(SUMMARY_OPTION) {
            return Err(malformed(format!(
                "[{MAIN_SECTION}] has no {SUMMARY_OPTION}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            options,
            sections,
        })
    }

    /// Render the profile in the tuned INI format.
    ///
    /// Empty sections are left out.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Unrepresentable`] if a value cannot be written
    /// so that it reads back unchanged.
    pub fn to_ini(&self) -> Result<String, ProfileError> {
        let main = std::iter::once((
            MAIN_SECTION,
            self.options
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect::<Vec<_>>(),
        ));
        let rest = self.sections.iter().map(|(name, section)| {
            (
                name.as_str(),
                section
                    .options
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect::<Vec<_>>(),
            )
        });
        ini::render_kv_sections(&[MANAGED_COMMENT], main.chain(rest)).map_err(|e| {
            ProfileError::Unrepresentable {
                section: e.section,
                option: e.key,
            }
        })
    }
}

//! Domain-specific error types for the kernel settings engine.
//!
//! Internal modules return typed errors (e.g., [`ProfileError`],
//! [`DocumentError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! KernelSettingsError
//! ├── Document(DocumentError): desired-state input: read, parse, structure
//! ├── Profile(ProfileError)  : loading and persisting the managed profile
//! ├── Merge(MergeError)      : applying a validated document to a profile
//! └── Settings(SettingsError): engine settings file
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the kernel settings engine.
#[derive(Error, Debug)]
pub enum KernelSettingsError {
    /// The desired-state document could not be used.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The managed profile could not be loaded or saved.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// The merge could not be completed.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// The engine settings could not be loaded.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Errors that arise from reading and validating a desired-state document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document file could not be read.
    #[error("IO error reading document {path}: {source}")]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid YAML, JSON or TOML.
    #[error("Unable to parse document as {format}: {message}")]
    Parse {
        /// Format the document was parsed as.
        format: String,
        /// Parser error message.
        message: String,
    },

    /// The document parsed but violates the item/section shape rules.
    ///
    /// Carries every diagnostic found in the document.
    #[error("Invalid format for input parameters ({} error(s))", .0.len())]
    Invalid(Vec<String>),
}

/// Errors that arise from loading and persisting profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The named profile does not exist yet.
    #[error("Error loading tuned profile [{name}]: Profile does not exist")]
    NotFound {
        /// Profile name.
        name: String,
    },

    /// The profile exists but cannot be interpreted.
    #[error("Error loading tuned profile [{name}]: {reason}")]
    Malformed {
        /// Profile name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The profile exists but could not be read.
    #[error("Error loading tuned profile [{name}]: {path}: {source}")]
    Io {
        /// Profile name.
        name: String,
        /// Path of the profile file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The merged profile could not be written.
    #[error("Unable to apply tuned settings: {path}: {source}")]
    Persist {
        /// Path of the profile file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The tuned activation registry could not be read or written.
    #[error("Unable to update active profile and/or mode: {path}: {source}")]
    Registry {
        /// Path of the registry file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An option value cannot be expressed in the profile file format.
    #[error("Unable to apply tuned settings: value of [{section}] {option} cannot be written")]
    Unrepresentable {
        /// Section holding the option.
        section: String,
        /// Option name.
        option: String,
    },
}

/// Errors that arise while merging a desired state into a profile.
#[derive(Error, Debug)]
pub enum MergeError {
    /// The existing command-line value is not a valid token sequence.
    #[error("section [{section}] option [{option}] has an unparsable value: {value}")]
    CommandLine {
        /// Section holding the field.
        section: String,
        /// Option name of the field.
        option: String,
        /// The raw value that failed to tokenize.
        value: String,
    },
}

/// Errors that arise from loading the engine settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("IO error reading settings file {path}: {source}")]
    Io {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for the settings schema.
    #[error("Invalid settings file {path}: {message}")]
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },
}

impl ProfileError {
    /// Return `true` if the error means the profile simply does not exist yet.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

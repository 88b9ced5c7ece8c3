//! Command: check a desired-state document without touching any profile.
use anyhow::Result;
use serde::Serialize;

use crate::cli::{DocumentOpts, GlobalOpts};
use crate::config::document;
use crate::config::validation::DocumentValidator;
use crate::error::DocumentError;
use crate::logging::Log;

/// Result of validating one document, printed as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateReport {
    pub valid: bool,
    /// Sections the document names, in document order.
    pub sections: Vec<String>,
    pub purge: bool,
    pub diagnostics: Vec<String>,
}

/// Run the validate command.
///
/// # Errors
///
/// Returns an error if the document cannot be read or parsed, or if it has
/// structural problems (after printing them).
pub fn run(global: &GlobalOpts, opts: &DocumentOpts, log: &dyn Log) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;

    log.stage("Validating document");
    let value = document::load(&opts.document, opts.format)?;
    let validation = DocumentValidator::new(&setup.settings.command_line).validate(&value);
    let diagnostics: Vec<String> = validation
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect();
    for diagnostic in &diagnostics {
        log.error(diagnostic);
    }

    let report = ValidateReport {
        valid: diagnostics.is_empty(),
        sections: validation.desired.sections.keys().cloned().collect(),
        purge: validation.desired.purge,
        diagnostics,
    };
    super::print_json(&report)?;

    if report.valid {
        log.info(&format!("document is valid ({} section(s))", report.sections.len()));
        Ok(())
    } else {
        Err(DocumentError::Invalid(report.diagnostics).into())
    }
}

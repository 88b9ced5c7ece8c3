//! Command: report current kernel settings of this system.
use anyhow::Result;

use crate::cli::ReportOpts;
use crate::discovery::Discovery;
use crate::logging::Log;

/// Run the report command.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run(opts: &ReportOpts, log: &dyn Log) -> Result<()> {
    log.stage(&format!("Reading settings under {}", opts.root.display()));
    let report = Discovery::new(&opts.root).collect(log);
    if opts.as_document {
        super::print_json(&report.to_document())
    } else {
        super::print_json(&report)
    }
}

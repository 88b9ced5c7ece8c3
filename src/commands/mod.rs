pub mod apply;
pub mod report;
pub mod show;
pub mod validate;
pub mod version;

use anyhow::Result;
use serde::Serialize;
use std::io::Write as _;

use crate::cli::GlobalOpts;
use crate::config::settings::Settings;
use crate::logging::Log;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    pub settings: Settings,
}

impl CommandSetup {
    /// Load the engine settings and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be read or
    /// parsed.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        log.stage("Loading settings");
        if let Some(path) = &global.config {
            log.debug(&format!("settings file: {}", path.display()));
        }
        let settings = Settings::load(global.config.as_deref(), &global.overrides())?;
        log.info(&format!("profile: {}", settings.profile_path().display()));
        log.debug(&format!(
            "command-line field: [{}] {}",
            settings.command_line.section, settings.command_line.option
        ));
        Ok(Self { settings })
    }
}

/// Write `value` to stdout as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

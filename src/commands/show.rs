//! Command: print an INI or properties file as JSON.
use anyhow::Result;
use serde_json::{Map, Value, json};

use crate::cli::ShowOpts;
use crate::config::ini::{self, DEFAULT_SECTION, KvDocument};
use crate::logging::Log;

/// Convert a parsed file into `{section: [{name, value}, ...]}`.
///
/// Entries before the first header go under `DEFAULT`; a repeated header
/// extends the list of its first occurrence.
#[must_use]
pub fn to_json(document: &KvDocument) -> Value {
    let mut out = Map::new();
    let defaults = (!document.defaults.is_empty()).then_some((DEFAULT_SECTION, &document.defaults));
    let sections = document
        .sections
        .iter()
        .map(|s| (s.header.as_str(), &s.entries));
    for (header, entries) in defaults.into_iter().chain(sections) {
        let items = out
            .entry(header)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = items {
            items.extend(
                entries
                    .iter()
                    .map(|(name, value)| json!({ "name": name, "value": value })),
            );
        }
    }
    Value::Object(out)
}

/// Run the show command.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn run(opts: &ShowOpts, log: &dyn Log) -> Result<()> {
    log.debug(&format!("reading {}", opts.path.display()));
    let document = ini::parse_kv_file(&opts.path)?;
    super::print_json(&to_json(&document))
}

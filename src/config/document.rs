//! Loading desired-state documents.
//!
//! Documents may be written as YAML, JSON or TOML. All three are read into
//! the same untyped [`serde_json::Value`] tree, which is what the validator
//! inspects.
use serde_json::Value;
use std::io::Read as _;
use std::path::Path;

use crate::error::DocumentError;

/// Path that means "read the document from standard input".
pub const STDIN_PATH: &str = "-";

/// Serialization format of a desired-state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// YAML (also accepts JSON, which is a YAML subset).
    #[default]
    Yaml,
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl Format {
    /// Pick a format from a file extension, defaulting to YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Parse document text in the given format.
///
/// An empty YAML document parses as `null`, which validates as "nothing to
/// do".
///
/// # Errors
///
/// Returns [`DocumentError::Parse`] if the text is not valid in `format`.
pub fn parse(content: &str, format: Format) -> Result<Value, DocumentError> {
    let parse_error = |message: String| DocumentError::Parse {
        format: format.name().to_string(),
        message,
    };
    match format {
        Format::Yaml if content.trim().is_empty() => Ok(Value::Null),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str::<toml::Value>(content)
            .map_err(|e| parse_error(e.message().to_string()))
            .and_then(|v| serde_json::to_value(v).map_err(|e| parse_error(e.to_string()))),
    }
}

/// Read and parse a document from `path`, or from stdin if `path` is `-`.
///
/// The format is taken from `format` if given, otherwise from the file
/// extension.
///
/// # Errors
///
/// Returns an error if the document cannot be read or parsed.
pub fn load(path: &Path, format: Option<Format>) -> Result<Value, DocumentError> {
    let io_error = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = if path == Path::new(STDIN_PATH) {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(io_error)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(io_error)?
    };
    parse(&content, format.unwrap_or_else(|| Format::from_path(path)))
}

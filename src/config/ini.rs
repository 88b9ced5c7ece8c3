//! The INI dialect of tuned profiles: parsing, rendering and value quoting.
use anyhow::{Context as _, Result, bail};
use std::path::Path;

/// Pseudo-section name for entries that appear before any header.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A key-value section of an INI file.
///
/// # Examples
///
/// ```
/// use kernel_settings::config::ini::KvSection;
///
/// let section = KvSection {
///     header: "sysctl".to_string(),
///     entries: vec![("fs.file-max".to_string(), "65535".to_string())],
/// };
/// assert_eq!(section.header, "sysctl");
/// assert_eq!(section.entries[0].0, "fs.file-max");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvSection {
    /// The raw section header (e.g., `"sysctl"`).
    pub header: String,
    /// Key-value entries within this section.
    pub entries: Vec<(String, String)>,
}

/// A parsed key-value INI file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvDocument {
    /// Entries before the first section header.
    pub defaults: Vec<(String, String)>,
    /// Sections in file order. A header that repeats yields two sections.
    pub sections: Vec<KvSection>,
}

/// A value that no quoting style can carry through a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnquotableValue {
    /// Section holding the entry.
    pub section: String,
    /// Key of the entry.
    pub key: String,
}

/// Parse a key-value INI file. A missing file parses as empty.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn parse_kv_file(path: &Path) -> Result<KvDocument> {
    let content = read_file(path)?;
    parse_kv_sections_from_str(&content)
}

/// Parse key-value INI content from a string.
///
/// Headers preserve original case. Inline comments (` #` or `\t#`) are
/// stripped from unquoted values; a value wrapped in matching single or double
/// quotes is taken literally.
///
/// # Examples
///
/// ```
/// use kernel_settings::config::ini::parse_kv_sections_from_str;
///
/// let doc = parse_kv_sections_from_str(
///     "[sysctl]\nfs.file-max = 65535 # raised\nkernel.domainname = \"a #b\"\n"
/// ).unwrap();
/// assert_eq!(doc.sections[0].entries[0].1, "65535");
/// assert_eq!(doc.sections[0].entries[1].1, "a #b");
/// ```
///
/// # Errors
///
/// Returns an error if a non-comment line is neither a header nor a
/// `key = value` pair.
pub fn parse_kv_sections_from_str(content: &str) -> Result<KvDocument> {
    let mut document = KvDocument::default();
    let mut current: Option<KvSection> = None;

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(header) = parse_raw_header(trimmed) {
            if let Some(section) = current.take() {
                document.sections.push(section);
            }
            current = Some(KvSection {
                header,
                entries: Vec::new(),
            });
            continue;
        }

        let Some(entry) = parse_kv_line(trimmed) else {
            bail!(
                "invalid key-value pair at line {}: {}",
                line_num + 1,
                trimmed
            );
        };
        match current {
            Some(ref mut section) => section.entries.push(entry),
            None => document.defaults.push(entry),
        }
    }

    if let Some(section) = current {
        document.sections.push(section);
    }

    Ok(document)
}

/// Render sections as `key = value` lines under `[header]` lines.
///
/// `comment` lines come first, each prefixed with `# `. Sections without
/// entries are skipped. Values are quoted when they would otherwise not
/// survive [`parse_kv_sections_from_str`].
///
/// # Errors
///
/// Returns the first entry whose value cannot be quoted at all.
pub fn render_kv_sections<'a, S, E>(comment: &[&str], sections: S) -> Result<String, UnquotableValue>
where
    S: IntoIterator<Item = (&'a str, E)>,
    E: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for line in comment {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }

    for (header, entries) in sections {
        let mut body = String::new();
        for (key, value) in entries {
            let value = quote_value(value).ok_or_else(|| UnquotableValue {
                section: header.to_string(),
                key: key.to_string(),
            })?;
            body.push_str(key);
            body.push_str(" = ");
            body.push_str(&value);
            body.push('\n');
        }
        if body.is_empty() {
            continue;
        }
        out.push('[');
        out.push_str(header);
        out.push_str("]\n");
        out.push_str(&body);
    }

    Ok(out)
}

/// Quote `value` if needed so that parsing yields it back unchanged.
///
/// Returns `None` for values no quoting style can carry.
#[must_use]
pub fn quote_value(value: &str) -> Option<String> {
    if value.contains(['\n', '\r', '\0']) {
        return None;
    }
    if !needs_quoting(value) {
        return Some(value.to_string());
    }
    ['"', '\'']
        .into_iter()
        .find(|q| !value.contains(*q))
        .map(|q| format!("{q}{value}{q}"))
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.starts_with('#')
        || value.contains(" #")
        || value.contains("\t#")
        || unquote(value).is_some()
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` line, unquoting or stripping inline comments from
/// the value.
///
/// - `"fs.file-max = 65535 # comment"` → `("fs.file-max", "65535")`
/// - `"cmdline = 'a b' c"` → `("cmdline", "'a b' c")`
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = unquote(value).unwrap_or_else(|| strip_inline_comment(value));
    Some((key.to_string(), value.to_string()))
}

/// Return the inner text of a value wrapped in matching quotes, optionally
/// followed by a comment.
fn unquote(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let rest = value.get(1..)?;
    let end = rest.find(quote)?;
    let tail = rest.get(end + 1..)?.trim_start();
    if tail.is_empty() || tail.starts_with('#') {
        rest.get(..end)
    } else {
        None
    }
}

/// Strip inline comments (`#` preceded by whitespace) from a value.
fn strip_inline_comment(value: &str) -> &str {
    value
        .find(" #")
        .or_else(|| value.find("\t#"))
        .map_or(value, |idx| value[..idx].trim_end())
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn entries(content: &str) -> Vec<(String, String)> {
        parse_kv_sections_from_str(content)
            .expect("test data should parse")
            .sections
            .into_iter()
            .flat_map(|s| s.entries)
            .collect()
    }

    #[test]
    fn parse_kv_simple() {
        let doc = parse_kv_sections_from_str("[main]\nsummary = kernel settings\n[sysctl]\na = 1\n")
            .expect("test data should parse");
        assert!(doc.defaults.is_empty());
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].header, "main");
        assert_eq!(
            doc.sections[0].entries,
            vec![("summary".to_string(), "kernel settings".to_string())]
        );
    }

    #[test]
    fn parse_kv_with_equals_in_value() {
        assert_eq!(
            entries("[bootloader]\ncmdline = spectre_v2=off nopti\n")[0].1,
            "spectre_v2=off nopti"
        );
    }

    #[test]
    fn parse_kv_strips_inline_comments() {
        assert_eq!(entries("[s]\nkey = value # comment\n")[0].1, "value");
    }

    #[test]
    fn parse_kv_keeps_hash_without_space() {
        assert_eq!(entries("[s]\nkey = color#FF0000\n")[0].1, "color#FF0000");
    }

    #[test]
    fn parse_kv_unquotes_wrapped_values() {
        assert_eq!(entries("[s]\nkey = \"\"\n")[0].1, "");
        assert_eq!(entries("[s]\nkey = ' padded '\n")[0].1, " padded ");
        assert_eq!(entries("[s]\nkey = \"a #b\" # note\n")[0].1, "a #b");
    }

    #[test]
    fn parse_kv_leaves_partial_quotes_alone() {
        assert_eq!(
            entries("[b]\ncmdline = 'a b' quiet\n")[0].1,
            "'a b' quiet"
        );
    }

    #[test]
    fn parse_kv_entries_before_header_are_defaults() {
        let doc = parse_kv_sections_from_str("key = value\n[s]\nx = 1\n").expect("parse");
        assert_eq!(doc.defaults, vec![("key".to_string(), "value".to_string())]);
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn parse_kv_rejects_line_without_equals() {
        assert!(parse_kv_sections_from_str("[s]\norphan\n").is_err());
    }

    #[test]
    fn parse_kv_skips_comments_and_blank_lines() {
        let doc = parse_kv_sections_from_str("# managed\n\n; note\n[s]\n\nx = 1\n")
            .expect("parse");
        assert_eq!(doc.sections[0].entries.len(), 1);
    }

    #[test]
    fn quote_value_only_when_needed() {
        assert_eq!(quote_value("65535").as_deref(), Some("65535"));
        assert_eq!(quote_value("a b").as_deref(), Some("a b"));
        assert_eq!(quote_value("").as_deref(), Some("\"\""));
        assert_eq!(quote_value(" x").as_deref(), Some("\" x\""));
        assert_eq!(quote_value("a #b").as_deref(), Some("\"a #b\""));
        assert_eq!(quote_value("'a'").as_deref(), Some("\"'a'\""));
        assert_eq!(quote_value("'a' 'b'").as_deref(), Some("'a' 'b'"));
        assert_eq!(quote_value("\"x\" y").as_deref(), Some("\"x\" y"));
    }

    #[test]
    fn quote_value_rejects_unrepresentable() {
        assert_eq!(quote_value("a\nb"), None);
        assert_eq!(quote_value("\"a\" #'b'"), None);
    }

    #[test]
    fn render_skips_empty_sections() {
        let rendered = render_kv_sections(
            &["managed"],
            [
                ("main", vec![("summary", "kernel settings")]),
                ("vm", vec![]),
                ("sysctl", vec![("fs.file-max", "65535"), ("x", "")]),
            ],
        )
        .expect("render");
        assert_eq!(
            rendered,
            "# managed\n[main]\nsummary = kernel settings\n[sysctl]\nfs.file-max = 65535\nx = \"\"\n"
        );
    }

    #[test]
    fn render_then_parse_preserves_values() {
        let values = ["plain", "", " lead", "a #b", "'q'", "x=1 y='a b'"];
        let rendered = render_kv_sections(
            &[],
            [(
                "s",
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (["k0", "k1", "k2", "k3", "k4", "k5"][i], *v))
                    .collect::<Vec<_>>(),
            )],
        )
        .expect("render");
        let parsed: Vec<String> = entries(&rendered).into_iter().map(|(_, v)| v).collect();
        assert_eq!(parsed, values);
    }

    #[test]
    fn render_reports_unquotable_entry() {
        let err = render_kv_sections(&[], [("sysctl", vec![("k", "a\nb")])]).unwrap_err();
        assert_eq!(
            err,
            UnquotableValue {
                section: "sysctl".to_string(),
                key: "k".to_string()
            }
        );
    }
}

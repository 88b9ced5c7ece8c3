//! Ordered `key[=value]` token lists such as a kernel command line.
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;

/// Error returned when text cannot be split into shell-style tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbalancedQuotes;

/// An ordered collection of command-line tokens.
///
/// Each token is a key with an optional value (`quiet` or `panic=10`). Keys
/// are unique; re-adding a key replaces its value without moving it.
///
/// # Examples
///
/// ```
/// use kernel_settings::profile::cmdline::CommandLine;
///
/// let mut cmdline = CommandLine::parse("foo=true bar baz").unwrap();
/// cmdline.add("foo", Some("false".to_string()));
/// cmdline.remove("bar");
/// assert_eq!(cmdline.to_string(), "foo=false baz");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    tokens: IndexMap<String, Option<String>>,
}

impl CommandLine {
    /// Split `text` shell-style into tokens.
    ///
    /// Each token is split at its first `=`; an empty value after `=` is a
    /// bare flag.
    ///
    /// # Errors
    ///
    /// Returns [`UnbalancedQuotes`] if the quoting in `text` is not closed.
    pub fn parse(text: &str) -> Result<Self, UnbalancedQuotes> {
        let words = shlex::split(text).ok_or(UnbalancedQuotes)?;
        let mut cmdline = Self::default();
        for word in words {
            let (key, value) = match word.split_once('=') {
                Some((key, value)) => (key, (!value.is_empty()).then(|| value.to_string())),
                None => (word.as_str(), None),
            };
            cmdline.add(key, value);
        }
        Ok(cmdline)
    }

    /// Add a token, or replace the value of an existing one in place.
    pub fn add(&mut self, key: &str, value: Option<String>) {
        if let Some(slot) = self.tokens.get_mut(key) {
            *slot = value;
        } else {
            self.tokens.insert(key.to_string(), value);
        }
    }

    /// Remove a token if present.
    pub fn remove(&mut self, key: &str) {
        self.tokens.shift_remove(key);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.tokens.get(key).map(Option::as_deref)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(key)?;
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                write!(f, "={}", quote(value))?;
            }
        }
        Ok(())
    }
}

/// Quote `value` only if it holds characters outside the shell-safe set
/// `[A-Za-z0-9_@%+=:,./-]`.
fn quote(value: &str) -> Cow<'_, str> {
    let safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        Cow::Borrowed(value)
    } else {
        // try_quote only fails on NUL, which validation already rejects
        shlex::try_quote(value).unwrap_or(Cow::Borrowed(value))
    }
}

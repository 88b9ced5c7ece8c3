//! Validated desired-state model.
//!
//! These types are only ever produced by
//! [`DocumentValidator`](super::validation::DocumentValidator); the merge
//! engine consumes them without re-checking shapes.
use indexmap::IndexMap;

/// The whole desired state: one directive per section plus the purge flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    /// Directives in document order.
    pub sections: IndexMap<String, SectionDirective>,
    /// Delete every existing section the document does not mention.
    pub purge: bool,
}

/// What to do with one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionDirective {
    /// Remove the section entirely (`{state: empty}`).
    Clear,
    /// Apply items in order, optionally clearing the section first.
    Items {
        /// A `{previous: replaced}` marker was present.
        replace: bool,
        /// Items in document order.
        items: Vec<Item>,
    },
}

/// One validated setting directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Set or replace an option.
    Assign {
        /// Option name.
        name: String,
        /// Stringified value.
        value: String,
    },
    /// Delete an option if present (`state: absent`).
    Remove {
        /// Option name.
        name: String,
    },
    /// Edit the distinguished command-line option token by token.
    CommandLine {
        /// Option name of the field.
        name: String,
        /// Start from an empty token list instead of the current value.
        replace: bool,
        /// Token operations in document order.
        tokens: Vec<TokenOp>,
    },
}

/// One token operation on a command-line field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOp {
    /// Add or replace a token; `None` is a bare flag.
    Add {
        /// Token key.
        name: String,
        /// Token value.
        value: Option<String>,
    },
    /// Remove a token if present.
    Remove {
        /// Token key.
        name: String,
    },
}

impl Item {
    /// Option name this item targets.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Assign { name, .. } | Self::Remove { name } | Self::CommandLine { name, .. } => {
                name
            }
        }
    }
}

impl DesiredState {
    /// Return `true` if the document asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && !self.purge
    }
}

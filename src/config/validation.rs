//! Structural validation of desired-state documents.
//!
//! The document arrives as an untyped tree (see [`document`](super::document))
//! and leaves as a [`DesiredState`]. Validation never stops at the first
//! problem: every violation in the document produces one [`Diagnostic`] so a
//! caller can fix everything in a single round trip.
use std::fmt;

use serde_json::{Map, Value};

use super::desired::{DesiredState, Item, SectionDirective, TokenOp};
use super::messages;
use super::settings::CommandLineField;

/// Reserved top-level key requesting purge semantics.
pub const PURGE_KEY: &str = "purge";

/// Profile section holding metadata; never addressable from a document.
pub const MAIN_SECTION: &str = "main";

/// Literal value of `previous` that marks a replace.
const PREVIOUS_REPLACED: &str = "replaced";

/// A structural problem found in a desired-state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Section the problem was found in (empty for document-level problems).
    pub section: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// The desired state; only meaningful when `diagnostics` is empty.
    pub desired: DesiredState,
    /// Every violation found, in document order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    /// Return the desired state, or the diagnostic messages if there were any.
    ///
    /// # Errors
    ///
    /// Returns the list of messages when the document had violations.
    pub fn into_result(self) -> Result<DesiredState, Vec<String>> {
        if self.diagnostics.is_empty() {
            Ok(self.desired)
        } else {
            Err(self.diagnostics.into_iter().map(|d| d.message).collect())
        }
    }
}

/// Where an item sits in the document; decides which shapes are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Direct element of a section list.
    Option,
    /// Element of a command-line field's token list.
    Token,
}

/// The fields common to every item after the shared checks passed.
struct Fields<'v> {
    name: String,
    value: Option<&'v Value>,
}

/// Validates desired-state documents against the item/section shape rules.
#[derive(Debug)]
pub struct DocumentValidator<'a> {
    command_line: &'a CommandLineField,
}

impl<'a> DocumentValidator<'a> {
    #[must_use]
    pub const fn new(command_line: &'a CommandLineField) -> Self {
        Self { command_line }
    }

    /// Validate a whole document.
    #[must_use]
    pub fn validate(&self, document: &Value) -> Validation {
        let mut validation = Validation::default();
        let map = match document {
            Value::Object(map) => map,
            Value::Null => return validation,
            other => {
                validation
                    .diagnostics
                    .push(Diagnostic::new("", messages::document_not_mapping(other)));
                return validation;
            }
        };

        for (section, value) in map {
            if section == PURGE_KEY {
                match value {
                    Value::Bool(purge) => validation.desired.purge = *purge,
                    Value::Null => {}
                    other => validation
                        .diagnostics
                        .push(Diagnostic::new("", messages::purge_not_boolean(other))),
                }
                continue;
            }
            if is_unset(value) {
                continue;
            }
            if let Some(directive) = self.section(section, value, &mut validation.diagnostics) {
                validation
                    .desired
                    .sections
                    .insert(section.clone(), directive);
            }
        }

        validation
    }

    fn section(
        &self,
        section: &str,
        value: &Value,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<SectionDirective> {
        let message = if !is_valid_section_name(section) {
            messages::section_name_not_valid(section)
        } else if section == MAIN_SECTION {
            messages::section_name_reserved(section)
        } else {
            match value {
                Value::Object(map) if is_clear_sentinel(map) => {
                    return Some(SectionDirective::Clear);
                }
                Value::Object(_) => messages::remove_section_value(section),
                Value::Array(elements) => {
                    return Some(self.section_items(section, elements, diagnostics));
                }
                _ => messages::section_dict_or_list(section),
            }
        };
        diagnostics.push(Diagnostic::new(section, message));
        None
    }

    fn section_items(
        &self,
        section: &str,
        elements: &[Value],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> SectionDirective {
        let mut replace = false;
        let mut items = Vec::with_capacity(elements.len());

        for element in elements {
            let Value::Object(map) = element else {
                diagnostics.push(Diagnostic::new(
                    section,
                    messages::item_not_dict(section, element),
                ));
                continue;
            };
            if map.is_empty() {
                continue;
            }
            if let Some(previous) = map.get("previous") {
                if previous.as_str() != Some(PREVIOUS_REPLACED) {
                    diagnostics.push(Diagnostic::new(
                        section,
                        messages::item_previous(section, previous),
                    ));
                } else if map.len() > 1 {
                    diagnostics.push(Diagnostic::new(
                        section,
                        messages::marker_has_extra_keys(section),
                    ));
                } else {
                    replace = true;
                }
                continue;
            }
            if let Some(item) = self.option_item(section, map, diagnostics) {
                items.push(item);
            }
        }

        SectionDirective::Items { replace, items }
    }

    fn option_item(
        &self,
        section: &str,
        map: &Map<String, Value>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Item> {
        let fields = match digest_fields(section, map, Level::Option) {
            Ok(fields) => fields,
            Err(message) => {
                diagnostics.push(Diagnostic::new(section, message));
                return None;
            }
        };
        let name = fields.name;
        if !is_representable_option_name(&name) {
            diagnostics.push(Diagnostic::new(
                section,
                messages::name_not_representable(section, &name),
            ));
            return None;
        }

        let is_command_line = self.command_line.matches(section, &name);
        let outcome = match fields.value {
            None => Ok(Item::Remove { name }),
            Some(Value::Array(elements)) if is_command_line => {
                let (replace, tokens) = command_line_tokens(section, &name, elements, diagnostics)?;
                Ok(Item::CommandLine {
                    name,
                    replace,
                    tokens,
                })
            }
            Some(value @ Value::Array(_)) => Err(messages::list_not_allowed(section, &name, value)),
            Some(value) if is_command_line => {
                Err(messages::command_line_must_be_list(section, &name, value))
            }
            Some(value) => {
                scalar_string(section, &name, value).map(|value| Item::Assign { name, value })
            }
        };

        match outcome {
            Ok(item) => Some(item),
            Err(message) => {
                diagnostics.push(Diagnostic::new(section, message));
                None
            }
        }
    }
}

/// Validate the token list of a command-line field.
///
/// Returns `None` if any element was invalid; every invalid element is
/// reported.
fn command_line_tokens(
    section: &str,
    name: &str,
    elements: &[Value],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(bool, Vec<TokenOp>)> {
    let before = diagnostics.len();
    let mut replace = false;
    let mut tokens = Vec::with_capacity(elements.len());

    for element in elements {
        let Value::Object(map) = element else {
            diagnostics.push(Diagnostic::new(
                section,
                messages::value_item_not_dict(section, name, element),
            ));
            continue;
        };
        let outcome = match map.get("previous") {
            Some(previous) if previous.as_str() != Some(PREVIOUS_REPLACED) => {
                Err(messages::value_item_previous(section, name, previous))
            }
            Some(_) if map.len() > 1 => Err(messages::marker_has_extra_keys(section)),
            Some(_) => {
                replace = true;
                continue;
            }
            None => token_op(section, map),
        };
        match outcome {
            Ok(token) => tokens.push(token),
            Err(message) => diagnostics.push(Diagnostic::new(section, message)),
        }
    }

    (diagnostics.len() == before).then_some((replace, tokens))
}

/// Validate one command-line token element.
fn token_op(section: &str, map: &Map<String, Value>) -> Result<TokenOp, String> {
    let fields = digest_fields(section, map, Level::Token)?;
    let name = fields.name;
    if !is_representable_token_name(&name) {
        return Err(messages::name_not_representable(section, &name));
    }
    match fields.value {
        None if is_absent(map) => Ok(TokenOp::Remove { name }),
        None => Ok(TokenOp::Add { name, value: None }),
        Some(value @ Value::Array(_)) => Err(messages::list_not_allowed(section, &name, value)),
        Some(value) => {
            let value = scalar_string(section, &name, value)?;
            Ok(TokenOp::Add {
                name,
                value: (!value.is_empty()).then_some(value),
            })
        }
    }
}

/// Apply the checks shared by every item shape, in a fixed order, stopping at
/// the first one that fails.
///
/// A `value` of `null` counts as absent, and so does a `state` of `null`.
fn digest_fields<'v>(
    section: &str,
    map: &'v Map<String, Value>,
    level: Level,
) -> Result<Fields<'v>, String> {
    let name = map.get("name").filter(|v| !v.is_null());
    let value = map.get("value").filter(|v| !v.is_null());
    let state = map.get("state").filter(|v| !v.is_null());
    let allow_empty = level == Level::Token;

    let Some(name) = name else {
        return Err(messages::section_missing_name(
            section,
            &Value::Object(map.clone()),
        ));
    };
    let name = match name {
        Value::String(s) if !s.is_empty() => s.clone(),
        other => return Err(messages::name_not_valid(section, other)),
    };
    if value.is_none() && state.is_none() && !allow_empty {
        return Err(messages::no_value_or_state(section, &name));
    }
    if value.is_some() && state.is_some() {
        return Err(messages::both_value_and_state(section, &name));
    }
    if let Some(state) = state
        && state.as_str() != Some("absent")
    {
        return Err(messages::state_not_absent(section, &name, state));
    }
    let leftovers: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "name" | "value" | "state"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !leftovers.is_empty() {
        return Err(messages::unexpected_values(
            section,
            &name,
            &Value::Object(leftovers),
        ));
    }
    if let Some(Value::Bool(flag)) = value {
        return Err(messages::value_is_boolean(section, &name, *flag));
    }

    Ok(Fields { name, value })
}

/// Stringify a scalar value the way it is written to the profile.
fn scalar_string(section: &str, name: &str, value: &Value) -> Result<String, String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(messages::value_not_scalar(section, name, other)),
    };
    if text.contains(['\n', '\r', '\0']) {
        return Err(messages::value_not_representable(section, name));
    }
    Ok(text)
}

fn is_absent(map: &Map<String, Value>) -> bool {
    map.get("state").and_then(Value::as_str) == Some("absent")
}

/// Return `true` if a top-level value means "section not given".
fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_clear_sentinel(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get("state").and_then(Value::as_str) == Some("empty")
}

fn is_valid_section_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed == name && !name.contains(['[', ']', '\n', '\r', '\0'])
}

/// Option names must survive the `name = value` line format.
fn is_representable_option_name(name: &str) -> bool {
    name.trim() == name
        && !name.starts_with(['#', ';', '['])
        && !name.contains(['=', '\n', '\r', '\0'])
}

/// Token names must survive shell-style splitting and the `key=value` form.
fn is_representable_token_name(name: &str) -> bool {
    !name.contains(|c: char| c.is_whitespace() || matches!(c, '=' | '\'' | '"' | '\\' | '\0'))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field() -> CommandLineField {
        CommandLineField::default()
    }

    fn messages_for(document: &Value) -> Vec<String> {
        let field = field();
        DocumentValidator::new(&field)
            .validate(document)
            .diagnostics
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    fn item_messages(section: &str, item: &Value) -> Vec<String> {
        messages_for(&json!({ section: [item] }))
    }

    fn desired(document: &Value) -> DesiredState {
        let field = field();
        DocumentValidator::new(&field)
            .validate(document)
            .into_result()
            .expect("document should validate")
    }

    // ------------------------------------------------------------------
    // Item rules
    // ------------------------------------------------------------------

    #[test]
    fn item_missing_name() {
        assert_eq!(
            item_messages("bogus", &json!({"value": 1})),
            ["Error: section [bogus] item is missing 'name': {\"value\":1}"]
        );
    }

    #[test]
    fn item_name_not_string() {
        assert_eq!(
            item_messages("bogus", &json!({"name": 1})),
            ["Error: section [bogus] item name [1] is not a valid string"]
        );
    }

    #[test]
    fn item_needs_value_or_state() {
        assert_eq!(
            item_messages("bogus", &json!({"name": "name"})),
            ["Error: section [bogus] item name [name] must have either a 'value' or 'state'"]
        );
    }

    #[test]
    fn item_with_value_and_state() {
        assert_eq!(
            item_messages(
                "bogus",
                &json!({"name": "name", "value": "value", "state": "state"})
            ),
            ["Error: section [bogus] item name [name] must have only one of 'value' or 'state'"]
        );
    }

    #[test]
    fn item_state_must_be_absent() {
        assert_eq!(
            item_messages("bogus", &json!({"name": "name", "state": 0})),
            ["Error: section [bogus] item name [name] state value must be 'absent' not [0]"]
        );
    }

    #[test]
    fn item_with_unexpected_keys() {
        assert_eq!(
            item_messages("bogus", &json!({"name": "name", "value": 1, "extra": "x"})),
            ["Error: section [bogus] item [name] has unexpected values {\"extra\":\"x\"}"]
        );
    }

    #[test]
    fn item_boolean_value_rejected() {
        assert_eq!(
            item_messages("sysctl", &json!({"name": "somename", "value": true})),
            [
                "Error: section [sysctl] item [somename] value [true] must not be a boolean - try quoting the value"
            ]
        );
    }

    #[test]
    fn item_list_value_outside_command_line() {
        assert_eq!(
            item_messages("bogus", &json!({"name": "name", "value": ["not a dict"]})),
            ["Error: section [bogus] item [name] has unexpected list value [\"not a dict\"]"]
        );
    }

    #[test]
    fn item_mapping_value_rejected() {
        assert_eq!(
            item_messages("sysctl", &json!({"name": "n", "value": {"a": 1}})),
            ["Error: section [sysctl] item [n] value {\"a\":1} must be a string or a number"]
        );
    }

    #[test]
    fn item_value_with_newline_rejected() {
        assert_eq!(
            item_messages("sysctl", &json!({"name": "n", "value": "a\nb"})),
            ["Error: section [sysctl] item [n] value must not contain line breaks or NUL"]
        );
    }

    #[test]
    fn item_name_with_equals_rejected() {
        let msgs = item_messages("sysctl", &json!({"name": "a=b", "value": 1}));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("cannot be written to a profile"));
    }

    #[test]
    fn item_name_read_back_as_comment_rejected() {
        for name in ["#kernel.x", ";kernel.x", "[kernel.x"] {
            let msgs = item_messages("sysctl", &json!({"name": name, "value": "1"}));
            assert_eq!(msgs.len(), 1, "{name}: {msgs:?}");
            assert!(msgs[0].contains("cannot be written to a profile"));
        }
    }

    #[test]
    fn command_line_empty_token_value_is_a_flag() {
        let desired = desired(&json!({"bootloader": [
            {"name": "cmdline", "value": [{"name": "quiet", "value": ""}]}
        ]}));
        assert_eq!(
            desired.sections["bootloader"],
            SectionDirective::Items {
                replace: false,
                items: vec![Item::CommandLine {
                    name: "cmdline".to_string(),
                    replace: false,
                    tokens: vec![TokenOp::Add {
                        name: "quiet".to_string(),
                        value: None,
                    }],
                }],
            }
        );
    }

    #[test]
    fn command_line_must_be_list() {
        assert_eq!(
            item_messages("bootloader", &json!({"name": "cmdline", "value": "not a list"})),
            ["Error: section [bootloader] item [cmdline] must be a list not [not a list]"]
        );
    }

    #[test]
    fn command_line_token_not_dict() {
        assert_eq!(
            item_messages(
                "bootloader",
                &json!({"name": "cmdline", "value": ["not a dict"]})
            ),
            ["Error: section [bootloader] item name [cmdline] value [not a dict] is not a dict"]
        );
    }

    #[test]
    fn command_line_invalid_previous() {
        assert_eq!(
            item_messages(
                "bootloader",
                &json!({"name": "cmdline", "value": [{"previous": "invalid"}]})
            ),
            [
                "Error: section [bootloader] item name [cmdline] has invalid value for 'previous' [invalid]"
            ]
        );
    }

    #[test]
    fn command_line_token_list_value_not_allowed() {
        assert_eq!(
            item_messages(
                "bootloader",
                &json!({"name": "cmdline", "value": [{"name": "x", "value": ["y"]}]})
            ),
            ["Error: section [bootloader] item [x] has unexpected list value [\"y\"]"]
        );
    }

    #[test]
    fn command_line_reports_every_bad_token() {
        let msgs = item_messages(
            "bootloader",
            &json!({"name": "cmdline", "value": [
                0,
                {"name": "ok"},
                {"name": "flag", "value": false},
                {"name": "x", "state": "present"},
            ]}),
        );
        assert_eq!(msgs.len(), 3, "{msgs:?}");
    }

    #[test]
    fn command_line_token_name_with_space_rejected() {
        let msgs = item_messages(
            "bootloader",
            &json!({"name": "cmdline", "value": [{"name": "a b"}]}),
        );
        assert_eq!(msgs.len(), 1);
    }

    // ------------------------------------------------------------------
    // Section rules
    // ------------------------------------------------------------------

    #[test]
    fn section_dict_other_than_sentinel() {
        assert_eq!(
            messages_for(&json!({"section": {"bogus": "dict"}})),
            [
                r#"Error: to remove the section [section] specify the value {"state": "empty"}"#
            ]
        );
    }

    #[test]
    fn section_scalar_value() {
        assert_eq!(
            messages_for(&json!({"section": 0})),
            ["Error: section [section] value must be a dict or a list"]
        );
    }

    #[test]
    fn section_element_not_dict() {
        assert_eq!(
            messages_for(&json!({"section": [0]})),
            ["Error: section [section] item value [0] is not a dict"]
        );
    }

    #[test]
    fn section_invalid_previous() {
        assert_eq!(
            messages_for(&json!({"section": [{"previous": "bogus"}]})),
            ["Error: section [section] item has invalid value for 'previous' [bogus]"]
        );
    }

    #[test]
    fn section_main_is_reserved() {
        assert_eq!(
            messages_for(&json!({"main": [{"name": "summary", "value": "x"}]})),
            ["Error: section [main] is reserved for profile metadata"]
        );
    }

    #[test]
    fn section_marker_with_extra_keys() {
        assert_eq!(
            messages_for(&json!({"sysctl": [{"previous": "replaced", "name": "x"}]})),
            ["Error: section [sysctl] item with 'previous' must not have other keys"]
        );
    }

    #[test]
    fn purge_must_be_boolean() {
        assert_eq!(
            messages_for(&json!({"purge": "yes"})),
            ["Error: purge must be a boolean not [yes]"]
        );
    }

    #[test]
    fn document_must_be_mapping() {
        assert_eq!(
            messages_for(&json!(["sysctl"])),
            ["Error: the desired state must be a dict of sections, not a list"]
        );
    }

    #[test]
    fn every_violation_is_reported_in_order() {
        let msgs = messages_for(&json!({
            "sysctl": [
                {"value": 1},
                {"name": "a", "value": true},
                {"name": "b", "value": 2},
            ],
            "vm": {"state": "full"},
            "sysfs": 3,
            "bootloader": [{"name": "cmdline", "value": "quiet"}],
        }));
        assert_eq!(msgs.len(), 5, "{msgs:?}");
        assert!(msgs[0].contains("[sysctl] item is missing 'name'"));
        assert!(msgs[1].contains("must not be a boolean"));
        assert!(msgs[2].contains("to remove the section [vm]"));
        assert!(msgs[3].contains("[sysfs] value must be a dict or a list"));
        assert!(msgs[4].contains("must be a list not [quiet]"));
    }

    // ------------------------------------------------------------------
    // Digesting valid documents
    // ------------------------------------------------------------------

    #[test]
    fn valid_items_are_digested_in_order() {
        let state = desired(&json!({
            "sysctl": [
                {"name": "fs.epoll.max_user_watches", "value": 785_592},
                {"name": "kernel.threads-max", "state": "absent"},
                {},
            ],
            "vm": {"state": "empty"},
        }));
        assert!(!state.purge);
        let keys: Vec<&str> = state.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sysctl", "vm"]);
        assert_eq!(
            state.sections["sysctl"],
            SectionDirective::Items {
                replace: false,
                items: vec![
                    Item::Assign {
                        name: "fs.epoll.max_user_watches".into(),
                        value: "785592".into()
                    },
                    Item::Remove {
                        name: "kernel.threads-max".into()
                    },
                ],
            }
        );
        assert_eq!(state.sections["vm"], SectionDirective::Clear);
    }

    #[test]
    fn replace_marker_flags_section() {
        let state = desired(&json!({"section": [{"previous": "replaced"}]}));
        assert_eq!(
            state.sections["section"],
            SectionDirective::Items {
                replace: true,
                items: vec![]
            }
        );
    }

    #[test]
    fn command_line_tokens_are_digested() {
        let state = desired(&json!({
            "bootloader": [{"name": "cmdline", "value": [
                {"previous": "replaced"},
                {"name": "spectre_v2", "value": "off"},
                {"name": "nopti"},
                {"name": "panic", "value": 10001},
                {"name": "splash", "state": "absent"},
            ]}],
        }));
        assert_eq!(
            state.sections["bootloader"],
            SectionDirective::Items {
                replace: false,
                items: vec![Item::CommandLine {
                    name: "cmdline".into(),
                    replace: true,
                    tokens: vec![
                        TokenOp::Add {
                            name: "spectre_v2".into(),
                            value: Some("off".into())
                        },
                        TokenOp::Add {
                            name: "nopti".into(),
                            value: None
                        },
                        TokenOp::Add {
                            name: "panic".into(),
                            value: Some("10001".into())
                        },
                        TokenOp::Remove {
                            name: "splash".into()
                        },
                    ],
                }],
            }
        );
    }

    #[test]
    fn unset_sections_and_purge_flag() {
        let state = desired(&json!({"sysctl": null, "sysfs": [], "purge": true}));
        assert!(state.sections.is_empty());
        assert!(state.purge);
    }

    #[test]
    fn null_value_counts_as_missing() {
        assert_eq!(
            item_messages("sysctl", &json!({"name": "x", "value": null})),
            ["Error: section [sysctl] item name [x] must have either a 'value' or 'state'"]
        );
    }
}

//! Diagnostic message table for desired-state validation.
//!
//! Every structural violation maps to exactly one of these messages. Values
//! are rendered with [`render`] so that strings appear bare and everything
//! else appears as compact JSON.
use serde_json::Value;

/// Literal a section must equal to be cleared entirely.
pub const REMOVE_SECTION_VALUE: &str = r#"{"state": "empty"}"#;

/// Render a document value for inclusion in a diagnostic.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn section_missing_name(section: &str, item: &Value) -> String {
    format!(
        "Error: section [{section}] item is missing 'name': {}",
        render(item)
    )
}

pub fn name_not_valid(section: &str, name: &Value) -> String {
    format!(
        "Error: section [{section}] item name [{}] is not a valid string",
        render(name)
    )
}

pub fn no_value_or_state(section: &str, name: &str) -> String {
    format!("Error: section [{section}] item name [{name}] must have either a 'value' or 'state'")
}

pub fn both_value_and_state(section: &str, name: &str) -> String {
    format!("Error: section [{section}] item name [{name}] must have only one of 'value' or 'state'")
}

pub fn state_not_absent(section: &str, name: &str, state: &Value) -> String {
    format!(
        "Error: section [{section}] item name [{name}] state value must be 'absent' not [{}]",
        render(state)
    )
}

pub fn unexpected_values(section: &str, name: &str, leftovers: &Value) -> String {
    format!(
        "Error: section [{section}] item [{name}] has unexpected values {}",
        render(leftovers)
    )
}

pub fn value_is_boolean(section: &str, name: &str, value: bool) -> String {
    format!(
        "Error: section [{section}] item [{name}] value [{value}] must not be a boolean - try quoting the value"
    )
}

pub fn list_not_allowed(section: &str, name: &str, value: &Value) -> String {
    format!(
        "Error: section [{section}] item [{name}] has unexpected list value {}",
        render(value)
    )
}

pub fn value_item_not_dict(section: &str, name: &str, element: &Value) -> String {
    format!(
        "Error: section [{section}] item name [{name}] value [{}] is not a dict",
        render(element)
    )
}

pub fn value_item_previous(section: &str, name: &str, previous: &Value) -> String {
    format!(
        "Error: section [{section}] item name [{name}] has invalid value for 'previous' [{}]",
        render(previous)
    )
}

pub fn command_line_must_be_list(section: &str, name: &str, value: &Value) -> String {
    format!(
        "Error: section [{section}] item [{name}] must be a list not [{}]",
        render(value)
    )
}

pub fn value_not_scalar(section: &str, name: &str, value: &Value) -> String {
    format!(
        "Error: section [{section}] item [{name}] value {} must be a string or a number",
        render(value)
    )
}

pub fn name_not_representable(section: &str, name: &str) -> String {
    format!(
        "Error: section [{section}] item name [{}] cannot be written to a profile",
        name.escape_debug()
    )
}

pub fn value_not_representable(section: &str, name: &str) -> String {
    format!("Error: section [{section}] item [{name}] value must not contain line breaks or NUL")
}

pub fn remove_section_value(section: &str) -> String {
    format!("Error: to remove the section [{section}] specify the value {REMOVE_SECTION_VALUE}")
}

pub fn item_not_dict(section: &str, element: &Value) -> String {
    format!(
        "Error: section [{section}] item value [{}] is not a dict",
        render(element)
    )
}

pub fn item_previous(section: &str, previous: &Value) -> String {
    format!(
        "Error: section [{section}] item has invalid value for 'previous' [{}]",
        render(previous)
    )
}

pub fn marker_has_extra_keys(section: &str) -> String {
    format!("Error: section [{section}] item with 'previous' must not have other keys")
}

pub fn section_dict_or_list(section: &str) -> String {
    format!("Error: section [{section}] value must be a dict or a list")
}

pub fn section_name_reserved(section: &str) -> String {
    format!("Error: section [{section}] is reserved for profile metadata")
}

pub fn section_name_not_valid(section: &str) -> String {
    format!(
        "Error: section name [{}] is not a valid section name",
        section.escape_debug()
    )
}

pub fn purge_not_boolean(value: &Value) -> String {
    format!(
        "Error: purge must be a boolean not [{}]",
        render(value)
    )
}

pub fn document_not_mapping(value: &Value) -> String {
    let kind = match value {
        Value::Array(_) => "a list",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Null => "empty",
        Value::Object(_) => "a dict",
    };
    format!("Error: the desired state must be a dict of sections, not {kind}")
}

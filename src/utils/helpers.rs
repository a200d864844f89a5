use crate::constants::MIN_KEYWORD_LEN;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Run inputs: values substituted into `{key}` placeholders.
pub type Inputs = BTreeMap<String, Value>;

/// Replaces every `{key}` in `template` with the matching input value.
///
/// String values are inserted verbatim, other JSON values in their JSON form.
/// Placeholders without a matching input are left untouched. Substituted
/// values are never scanned again.
///
/// # Arguments
/// * `template` - Text containing `{key}` placeholders
/// * `inputs` - Values to substitute
pub fn interpolate_inputs(template: &str, inputs: &Inputs) -> String {
    if inputs.is_empty() || !template.contains('{') {
        return template.to_string();
    }

    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key = after.find('}').map(|close| &after[..close]);
        match key.filter(|k| !k.contains('{')).and_then(|k| inputs.get(k).map(|v| (k, v))) {
            Some((key, value)) => {
                match value {
                    Value::String(s) => result.push_str(s),
                    other => result.push_str(&other.to_string()),
                }
                rest = &after[key.len() + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Cuts `text` to at most `max_chars` characters, appending a marker when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("\n[truncated]");
    truncated
}

/// Lowercased alphanumeric words of at least [`MIN_KEYWORD_LEN`] characters.
pub fn keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .map(|w| w.to_lowercase())
        .collect()
}

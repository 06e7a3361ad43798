//! Section normalization: the raw upstream mapping becomes a [`SectionSet`].

use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    domain::section::{SectionContent, SectionSet, UpstreamContentError},
    taxonomy::Taxonomy,
};

/// Key under which some producers nest the section mapping.
pub const NESTED_SECTIONS_KEY: &str = "proposal_sections";

/// Accepts either the section mapping itself or an envelope holding it
/// under `proposal_sections`.
pub fn sections_from_value(
    value: &Value,
    taxonomy: &Taxonomy,
) -> Result<SectionSet, UpstreamContentError> {
    let mapping = value.as_object().ok_or(UpstreamContentError::NotAMapping {
        found: json_kind(value),
    })?;

    match mapping.get(NESTED_SECTIONS_KEY) {
        Some(Value::Object(nested)) => Ok(normalize_sections(nested, taxonomy)),
        Some(other) => Err(UpstreamContentError::NotAMapping { found: json_kind(other) }),
        None => Ok(normalize_sections(mapping, taxonomy)),
    }
}

/// Drops excluded keys and coerces every value to text, keeping first-seen
/// key order.
pub fn normalize_sections(raw: &Map<String, Value>, taxonomy: &Taxonomy) -> SectionSet {
    raw.iter()
        .filter(|(key, _)| {
            let excluded = taxonomy.is_excluded(key);
            if excluded {
                debug!(event_name = "content.section.excluded", section = %key, "dropping metadata key");
            }
            !excluded
        })
        .map(|(key, value)| SectionContent::new(key.as_str(), value_to_text(value)))
        .collect()
}

/// Strings pass through; sequences become `• item` lines; mappings become
/// indented JSON; `null` is empty.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => format!("• {text}"),
                other => format!("• {other}"),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_default(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

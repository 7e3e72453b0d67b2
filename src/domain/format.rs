//! Payload formatting for tool output
//!
//! Renders raw Confluence JSON into the plain-text blocks returned to the
//! caller. Field access is explicit optional extraction: a missing or
//! non-scalar field degrades to its named placeholder, never to a failure.

use serde_json::Value;

pub const BLOCK_SEPARATOR: &str = "\n---\n";
pub const UNKNOWN: &str = "Unknown";

pub const NO_SPACES_FOUND: &str = "No spaces found";
pub const NO_RESULTS_FOUND: &str = "No results found";

pub fn format_spaces(payload: &Value) -> String {
    let blocks: Vec<String> = results(payload)
        .iter()
        .map(|space| {
            format!(
                "\nSpace: {}\nKey: {}\nType: {}\nDescription: {}\n",
                scalar(space, &["name"], UNKNOWN),
                scalar(space, &["key"], UNKNOWN),
                scalar(space, &["type"], UNKNOWN),
                scalar(space, &["description", "plain", "value"], "No description"),
            )
        })
        .collect();

    join_blocks(blocks, NO_SPACES_FOUND.to_string())
}

pub fn format_page(payload: &Value) -> String {
    let labels: Vec<&str> = payload
        .pointer("/metadata/labels/results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|label| label.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let labels = if labels.is_empty() {
        "No labels".to_string()
    } else {
        labels.join(", ")
    };

    format!(
        "\nTitle: {}\nSpace: {}\nVersion: {}\nLabels: {}\n\nContent:\n{}\n",
        scalar(payload, &["title"], UNKNOWN),
        scalar(payload, &["space", "name"], UNKNOWN),
        scalar(payload, &["version", "number"], UNKNOWN),
        labels,
        scalar(payload, &["body", "storage", "value"], "No content"),
    )
}

pub fn format_search_results(payload: &Value) -> String {
    let blocks: Vec<String> = results(payload)
        .iter()
        .map(|content| {
            format!(
                "\nTitle: {}\nType: {}\nSpace: {}\nID: {}\nLast Updated: {}\n",
                scalar(content, &["title"], UNKNOWN),
                scalar(content, &["type"], UNKNOWN),
                scalar(content, &["space", "name"], UNKNOWN),
                scalar(content, &["id"], UNKNOWN),
                scalar(content, &["version", "when"], UNKNOWN),
            )
        })
        .collect();

    join_blocks(blocks, NO_RESULTS_FOUND.to_string())
}

pub fn format_pages(payload: &Value, space_key: &str) -> String {
    let blocks: Vec<String> = results(payload)
        .iter()
        .map(|page| {
            format!(
                "\nTitle: {}\nID: {}\nLast Updated: {}\n",
                scalar(page, &["title"], UNKNOWN),
                scalar(page, &["id"], UNKNOWN),
                scalar(page, &["version", "when"], UNKNOWN),
            )
        })
        .collect();

    join_blocks(blocks, format!("No pages found in space {space_key}"))
}

fn results(payload: &Value) -> &[Value] {
    payload
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn join_blocks(blocks: Vec<String>, empty_sentinel: String) -> String {
    if blocks.is_empty() {
        empty_sentinel
    } else {
        blocks.join(BLOCK_SEPARATOR)
    }
}

/// Walks `path` into the payload and renders the scalar found there. Strings
/// render bare, numbers and booleans via their display form; anything else
/// (missing, null, nested) yields `default`.
fn scalar(payload: &Value, path: &[&str], default: &str) -> String {
    let mut current = payload;
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next,
            None => return default.to_string(),
        }
    }

    match current {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => default.to_string(),
    }
}

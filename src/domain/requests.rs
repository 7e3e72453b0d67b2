//! Pure request builders for the Confluence REST endpoints
//!
//! Each builder resolves handler defaults and produces the endpoint path plus
//! the outgoing parameter mapping, with no I/O involved.

use serde_json::{json, Map, Value};

pub const DEFAULT_LIMIT: u32 = 25;
pub const DEFAULT_START: u32 = 0;

pub const SPACES_EXPAND: &str = "description.plain,homepage";
pub const PAGE_EXPAND: &str = "body.storage,version,space,metadata.labels";
pub const SEARCH_EXPAND: &str = "space,version";
pub const PAGES_EXPAND: &str = "version";

pub fn list_spaces_request(
    query: Option<&str>,
    limit: Option<u32>,
    start: Option<u32>,
) -> (String, Map<String, Value>) {
    let mut params = paged_params(limit, start);
    params.insert("expand".to_string(), json!(SPACES_EXPAND));
    if let Some(name) = query.map(str::trim).filter(|name| !name.is_empty()) {
        params.insert("name".to_string(), json!(name));
    }

    ("/space".to_string(), params)
}

pub fn get_page_request(page_id: &str) -> (String, Map<String, Value>) {
    let mut params = Map::new();
    params.insert("expand".to_string(), json!(PAGE_EXPAND));

    (format!("/content/{page_id}"), params)
}

pub fn search_content_request(
    query: &str,
    space_key: Option<&str>,
    limit: Option<u32>,
    start: Option<u32>,
) -> (String, Map<String, Value>) {
    let mut params = paged_params(limit, start);
    params.insert("cql".to_string(), json!(build_cql(query, space_key)));
    params.insert("expand".to_string(), json!(SEARCH_EXPAND));

    ("/content/search".to_string(), params)
}

pub fn list_pages_request(
    space_key: &str,
    limit: Option<u32>,
    start: Option<u32>,
) -> (String, Map<String, Value>) {
    let mut params = paged_params(limit, start);
    params.insert("spaceKey".to_string(), json!(space_key));
    params.insert("type".to_string(), json!("page"));
    params.insert("expand".to_string(), json!(PAGES_EXPAND));

    ("/content".to_string(), params)
}

// Embedded quotes in the query are passed through unescaped; Confluence's CQL
// quoting rules are upstream's contract, so the expression is forwarded as
// typed.
pub fn build_cql(query: &str, space_key: Option<&str>) -> String {
    let mut cql = format!("text ~ \"{query}\"");
    if let Some(key) = space_key.map(str::trim).filter(|key| !key.is_empty()) {
        cql.push_str(&format!(" AND space.key = \"{key}\""));
    }
    cql
}

fn paged_params(limit: Option<u32>, start: Option<u32>) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("limit".to_string(), json!(limit.unwrap_or(DEFAULT_LIMIT)));
    params.insert("start".to_string(), json!(start.unwrap_or(DEFAULT_START)));
    params
}

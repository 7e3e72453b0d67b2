//! Interactive tools exposed via Model Context Protocol
//!
//! Four read-only Confluence operations, each delegating to the
//! `ConfluenceApi` transport adapter and rendering the payload as plain text.
//! Adapter failures become the tool's text verbatim; callers never see an
//! exception-shaped error for an upstream problem.

use reqwest::Method;
use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::format::{format_page, format_pages, format_search_results, format_spaces};
use crate::domain::requests::{
    get_page_request, list_pages_request, list_spaces_request, search_content_request,
};
use crate::mcp::rpc::{json_rpc_error, json_rpc_error_with_data, json_rpc_result};
use crate::AppState;

#[macros::mcp_tool(
    name = "list_spaces",
    description = "List available Confluence spaces with optional name filtering"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ListSpacesTool {
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<u32>,
}

#[macros::mcp_tool(
    name = "get_page_content",
    description = "Get the content of a specific Confluence page by ID"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetPageContentTool {
    pub page_id: String,
}

#[macros::mcp_tool(
    name = "search_content",
    description = "Search Confluence content by text, optionally within one space"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct SearchContentTool {
    pub query: String,
    pub space_key: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<u32>,
}

#[macros::mcp_tool(
    name = "list_pages_in_space",
    description = "List the pages in a Confluence space"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct ListPagesInSpaceTool {
    pub space_key: String,
    pub limit: Option<u32>,
    pub start: Option<u32>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        ListSpacesTool::tool(),
        GetPageContentTool::tool(),
        SearchContentTool::tool(),
        ListPagesInSpaceTool::tool(),
    ]
}

pub async fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };
    let arguments = json!(tool_call.arguments.unwrap_or_default());

    match tool_call.name.as_str() {
        "list_spaces" => {
            let args: ListSpacesTool = match serde_json::from_value(arguments) {
                Ok(value) => value,
                Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
            };

            let (path, params) = list_spaces_request(args.query.as_deref(), args.limit, args.start);
            let text = match state.confluence.request(&path, Method::GET, &params).await {
                Ok(payload) => format_spaces(&payload),
                Err(err) => err.to_string(),
            };
            text_tool_result(id, text)
        }
        "get_page_content" => {
            let args: GetPageContentTool = match serde_json::from_value(arguments) {
                Ok(value) => value,
                Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
            };

            let (path, params) = get_page_request(&args.page_id);
            let text = match state.confluence.request(&path, Method::GET, &params).await {
                Ok(payload) => format_page(&payload),
                Err(err) => err.to_string(),
            };
            text_tool_result(id, text)
        }
        "search_content" => {
            let args: SearchContentTool = match serde_json::from_value(arguments) {
                Ok(value) => value,
                Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
            };

            let (path, params) = search_content_request(
                &args.query,
                args.space_key.as_deref(),
                args.limit,
                args.start,
            );
            let text = match state.confluence.request(&path, Method::GET, &params).await {
                Ok(payload) => format_search_results(&payload),
                Err(err) => err.to_string(),
            };
            text_tool_result(id, text)
        }
        "list_pages_in_space" => {
            let args: ListPagesInSpaceTool = match serde_json::from_value(arguments) {
                Ok(value) => value,
                Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
            };

            let (path, params) = list_pages_request(&args.space_key, args.limit, args.start);
            let text = match state.confluence.request(&path, Method::GET, &params).await {
                Ok(payload) => format_pages(&payload, &args.space_key),
                Err(err) => err.to_string(),
            };
            text_tool_result(id, text)
        }
        _ => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": tool_call.name,
                },
            })),
        ),
    }
}

fn text_tool_result(id: Option<Value>, text: String) -> Value {
    json_rpc_result(
        id,
        serde_json::to_value(CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(text, None, None))],
            is_error: None,
            meta: None,
            structured_content: None,
        })
        .expect("tool result serialization"),
    )
}

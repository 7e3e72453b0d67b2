use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod confluence_client;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use confluence_client::ConfluenceApi;

#[derive(Clone)]
pub struct AppState {
    pub mcp_api_token: Option<Arc<str>>,
    pub confluence: Arc<dyn ConfluenceApi>,
}

impl AppState {
    pub fn new(mcp_api_token: Option<String>, confluence: Arc<dyn ConfluenceApi>) -> Self {
        Self {
            mcp_api_token: mcp_api_token.map(Arc::<str>::from),
            confluence,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use reqwest::Method;
    use serde_json::{json, Map, Value};
    use tower::ServiceExt;

    use crate::confluence_client::{ConfluenceApi, RequestError};

    use super::*;

    struct MockConfluence {
        response: Result<Value, RequestError>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl MockConfluence {
        fn returning(response: Result<Value, RequestError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ConfluenceApi for MockConfluence {
        async fn request(
            &self,
            path: &str,
            _method: Method,
            params: &Map<String, Value>,
        ) -> Result<Value, RequestError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((path.to_string(), params.clone()));
            self.response.clone()
        }
    }

    fn app_with_mock(mock: Arc<MockConfluence>) -> Router {
        build_app(AppState::new(None, mock))
    }

    fn app() -> Router {
        app_with_mock(MockConfluence::returning(Ok(json!({"results": []}))))
    }

    fn app_with_token() -> Router {
        let mock = MockConfluence::returning(Ok(json!({"results": []})));
        build_app(AppState::new(Some("token-1234567890ab".to_string()), mock))
    }

    async fn post_mcp(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .method("POST")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("valid json response")
        };

        (status, value)
    }

    fn tool_call_body(id: u32, name: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
        .to_string()
    }

    fn tool_text(body: &Value) -> &str {
        body["result"]["content"][0]["text"]
            .as_str()
            .expect("tool text content")
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        assert_eq!(body, "{\"status\":\"ok\"}");
    }

    #[tokio::test]
    async fn discovery_names_the_mcp_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/mcp")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["mcp_endpoint"], "/mcp");
    }

    #[tokio::test]
    async fn mcp_initialize_returns_result() {
        let (status, body) = post_mcp(
            app(),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"test-client","version":"1.0.0"},"capabilities":{}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(
            body["result"]["serverInfo"]["name"],
            env!("CARGO_PKG_NAME")
        );
        assert!(body["result"]["capabilities"]["tools"].is_object());
        assert!(body["result"]["capabilities"]["resources"].is_null());
    }

    #[tokio::test]
    async fn mcp_tools_list_returns_all_four_tools() {
        let (status, body) = post_mcp(
            app(),
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .filter_map(|tool| tool["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "list_spaces",
                "get_page_content",
                "search_content",
                "list_pages_in_space"
            ]
        );
    }

    #[tokio::test]
    async fn list_spaces_formats_space_blocks() {
        let mock = MockConfluence::returning(Ok(json!({
            "results": [{
                "name": "Engineering",
                "key": "ENG",
                "type": "global",
                "description": {"plain": {"value": "Engineering docs"}}
            }]
        })));
        let (status, body) =
            post_mcp(app_with_mock(mock), &tool_call_body(3, "list_spaces", json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        let text = tool_text(&body);
        assert!(text.contains("Space: Engineering"));
        assert!(text.contains("Key: ENG"));
        assert!(text.contains("Description: Engineering docs"));
    }

    #[tokio::test]
    async fn list_spaces_forwards_pagination_params() {
        let mock = MockConfluence::returning(Ok(json!({"results": []})));
        let body = tool_call_body(4, "list_spaces", json!({"limit": 10, "start": 5}));
        let (status, _) = post_mcp(app_with_mock(mock.clone()), &body).await;

        assert_eq!(status, StatusCode::OK);
        let calls = mock.calls.lock().expect("calls lock");
        let (path, params) = calls.first().expect("one upstream call");
        assert_eq!(path, "/space");
        assert_eq!(params.get("limit"), Some(&json!(10)));
        assert_eq!(params.get("start"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn list_spaces_query_becomes_name_param() {
        let mock = MockConfluence::returning(Ok(json!({"results": []})));
        let body = tool_call_body(5, "list_spaces", json!({"query": "MySpace"}));
        let (status, _) = post_mcp(app_with_mock(mock.clone()), &body).await;

        assert_eq!(status, StatusCode::OK);
        let calls = mock.calls.lock().expect("calls lock");
        let (_, params) = calls.first().expect("one upstream call");
        assert_eq!(params.get("name"), Some(&json!("MySpace")));
        assert!(!params.contains_key("spaceKey"));
    }

    #[tokio::test]
    async fn list_spaces_empty_results_return_sentinel() {
        let (status, body) =
            post_mcp(app(), &tool_call_body(6, "list_spaces", json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tool_text(&body), "No spaces found");
    }

    #[tokio::test]
    async fn adapter_error_is_propagated_verbatim_as_tool_text() {
        let mock = MockConfluence::returning(Err(RequestError::http(
            reqwest::StatusCode::NOT_FOUND,
        )));
        let expected = RequestError::http(reqwest::StatusCode::NOT_FOUND).to_string();
        let (status, body) =
            post_mcp(app_with_mock(mock), &tool_call_body(7, "get_page_content", json!({"page_id": "123"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tool_text(&body), expected);
    }

    #[tokio::test]
    async fn get_page_content_renders_full_template() {
        let mock = MockConfluence::returning(Ok(json!({
            "title": "Release Plan",
            "space": {"name": "Engineering"},
            "version": {"number": 7},
            "metadata": {"labels": {"results": [{"name": "release"}]}},
            "body": {"storage": {"value": "<p>Ship it</p>"}}
        })));
        let (status, body) = post_mcp(
            app_with_mock(mock.clone()),
            &tool_call_body(8, "get_page_content", json!({"page_id": "12345"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let text = tool_text(&body);
        assert!(text.contains("Title: Release Plan"));
        assert!(text.contains("Version: 7"));
        assert!(text.contains("Labels: release"));
        assert!(text.contains("Content:\n<p>Ship it</p>"));

        let calls = mock.calls.lock().expect("calls lock");
        assert_eq!(calls.first().expect("one upstream call").0, "/content/12345");
    }

    #[tokio::test]
    async fn get_page_content_without_page_id_is_invalid_params() {
        let (status, body) =
            post_mcp(app(), &tool_call_body(9, "get_page_content", json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn search_content_builds_cql_with_space_filter() {
        let mock = MockConfluence::returning(Ok(json!({"results": []})));
        let body = tool_call_body(
            10,
            "search_content",
            json!({"query": "test query", "space_key": "DEV", "limit": 20, "start": 10}),
        );
        let (status, response) = post_mcp(app_with_mock(mock.clone()), &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tool_text(&response), "No results found");

        let calls = mock.calls.lock().expect("calls lock");
        let (path, params) = calls.first().expect("one upstream call");
        assert_eq!(path, "/content/search");
        let cql = params.get("cql").and_then(Value::as_str).expect("cql param");
        assert!(cql.contains("text ~ \"test query\""));
        assert!(cql.contains("space.key = \"DEV\""));
        assert_eq!(params.get("limit"), Some(&json!(20)));
        assert_eq!(params.get("start"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn list_pages_empty_results_name_the_space() {
        let (status, body) = post_mcp(
            app(),
            &tool_call_body(11, "list_pages_in_space", json!({"space_key": "DEV"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(tool_text(&body), "No pages found in space DEV");
    }

    #[tokio::test]
    async fn unknown_tool_returns_tool_not_found_data() {
        let (status, body) =
            post_mcp(app(), &tool_call_body(12, "unknown_tool", json!({}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["data"]["code"], "tool_not_found");
    }

    #[tokio::test]
    async fn mcp_unknown_method_returns_method_not_found() {
        let (status, body) =
            post_mcp(app(), r#"{"jsonrpc":"2.0","id":13,"method":"unknown"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn mcp_requires_token_when_configured() {
        let (status, _) = post_mcp(
            app_with_token(),
            r#"{"jsonrpc":"2.0","id":14,"method":"tools/list","params":{}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn mcp_accepts_configured_token() {
        let response = app_with_token()
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .method("POST")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer token-1234567890ab")
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","id":15,"method":"tools/list","params":{}}"#,
                    ))
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mcp_notification_returns_no_content() {
        let (status, body) = post_mcp(app(), r#"{"jsonrpc":"2.0","method":"ping"}"#).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn mcp_batch_mixed_requests_return_only_id_responses() {
        let (status, body) = post_mcp(
            app(),
            r#"[{"jsonrpc":"2.0","method":"ping"},{"jsonrpc":"2.0","id":100,"method":"ping"},{"jsonrpc":"2.0","id":200,"method":"tools/list","params":{}}]"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let responses = body.as_array().expect("batch response array");
        assert_eq!(responses.len(), 2);
        let ids: Vec<i64> = responses
            .iter()
            .filter_map(|item| item["id"].as_i64())
            .collect();
        assert!(ids.contains(&100));
        assert!(ids.contains(&200));
    }

    #[tokio::test]
    async fn mcp_parse_error_for_invalid_json() {
        let (status, body) = post_mcp(app(), "{").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn root_post_does_not_provide_mcp() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .method("POST")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
                    ))
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

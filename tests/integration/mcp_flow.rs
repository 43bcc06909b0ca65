/// End-to-end tests driving the MCP server with JSON-RPC lines
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use wellness_tracker_mcp::assistant::retry::no_backoff;
use wellness_tracker_mcp::mcp::McpServer;
use wellness_tracker_mcp::*;

/// Answers every prompt with the same JSON insight
struct CannedGenerator;

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        assert!(prompt.contains("User Query:"));
        Ok(r#"{"insights":[{"type":"success","title":"Rested","description":"Sleep looks steady"}]}"#.to_string())
    }
}

/// Answers the analysis prompt with a bare insight list
struct AnalystGenerator;

#[async_trait]
impl TextGenerator for AnalystGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        assert!(prompt.contains("Previous Day's Metrics:"));
        Ok(r#"[{"type":"warning","title":"Low water","description":"Drink more"}]"#.to_string())
    }
}

/// Always fails
struct DownGenerator;

#[async_trait]
impl TextGenerator for DownGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AssistantError> {
        Err(AssistantError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}

fn server_with(generator: Arc<dyn TextGenerator>) -> McpServer {
    let config = Config::from_lookup(|name| match name {
        "GEMINI_API_KEY" => Some("test-key".to_string()),
        "GOOGLE_FIT_CLIENT_ID" => Some("google-client".to_string()),
        _ => None,
    })
    .unwrap();
    let tracker = WellnessTrackerServer::with_components(
        SqliteStorage::open_in_memory().unwrap(),
        Assistant::new(generator).with_retry(2, no_backoff),
        config,
        UserId::new("tester"),
    );
    McpServer::new(tracker)
}

async fn call(server: &mut McpServer, request: Value) -> Value {
    let response = server
        .process_line(&request.to_string())
        .await
        .expect("request should be answered");
    serde_json::to_value(response).unwrap()
}

async fn call_tool(server: &mut McpServer, name: &str, arguments: Value) -> (String, bool) {
    let response = call(
        server,
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"name": name, "arguments": arguments}}),
    )
    .await;
    let result = &response["result"];
    (
        result["content"][0]["text"].as_str().unwrap().to_string(),
        result["isError"].as_bool().unwrap(),
    )
}

#[cfg(test)]
mod mcp_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_handshake_and_tool_list() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let init = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "test", "version": "1"}
            }}),
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(init["result"]["serverInfo"]["name"], "Wellness Tracker MCP");

        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.process_line(&notification.to_string()).await.is_none());

        let list = call(&mut server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let names: Vec<&str> = list["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"metrics_log"));
        assert!(names.contains(&"provider_status"));
        assert!(names.contains(&"health_goals"));
        assert!(names.contains(&"health_analysis"));
        assert!(list["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let bad_json = server.process_line("{not json").await.unwrap();
        assert_eq!(serde_json::to_value(bad_json).unwrap()["error"]["code"], -32700);

        let unknown = call(&mut server, json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})).await;
        assert_eq!(unknown["error"]["code"], -32601);

        let bad_args = call(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "health_chat", "arguments": {"text": 1}}}),
        )
        .await;
        assert_eq!(bad_args["error"]["code"], -32602);

        let (text, is_error) = call_tool(&mut server, "habit_create", json!({})).await;
        assert!(is_error);
        assert!(text.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_log_then_summarize_and_list() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (text, is_error) = call_tool(
            &mut server,
            "metrics_log",
            json!({"steps": 10000, "water_glasses": 9, "sleep_hours": 8.5}),
        )
        .await;
        assert!(!is_error, "{}", text);
        assert!(text.contains("Step Master"));
        assert!(text.contains("Hydration Hero"));

        let (again, _) = call_tool(&mut server, "metrics_log", json!({"steps": 11000})).await;
        assert!(!again.contains("Step Master"));

        let (summary, _) = call_tool(&mut server, "metrics_summary", json!({"days": 7})).await;
        assert!(summary.contains("11000"));

        let (achievements, _) = call_tool(&mut server, "achievements_list", json!({})).await;
        assert!(achievements.contains("Sleep Champion"));

        let (insights, is_error) = call_tool(&mut server, "health_insights", Value::Null).await;
        assert!(!is_error, "{}", insights);
        assert!(insights.contains("Tomorrow's Outlook"));
    }

    #[tokio::test]
    async fn test_invalid_metric_is_a_tool_error() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (text, is_error) = call_tool(&mut server, "metrics_log", json!({"mood": 7})).await;
        assert!(is_error);
        assert!(text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (reply, is_error) = call_tool(&mut server, "health_chat", json!({"message": "How is my sleep?"})).await;
        assert!(!is_error);
        assert_eq!(reply, "✅  Rested\n\nSleep looks steady");

        let (history, _) = call_tool(&mut server, "chat_history", json!({"action": "list"})).await;
        assert!(history.contains("You: How is my sleep?"));
        assert!(history.contains("Assistant: ✅  Rested"));

        let (cleared, _) = call_tool(&mut server, "chat_history", json!({"action": "clear"})).await;
        assert!(cleared.contains("Cleared 2 messages"));
    }

    #[tokio::test]
    async fn test_chat_falls_back_when_assistant_is_down() {
        let mut server = server_with(Arc::new(DownGenerator));

        let (reply, is_error) = call_tool(&mut server, "health_chat", json!({"message": "Hi"})).await;
        assert!(!is_error);
        assert_eq!(reply, assistant::ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_provider_tools() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (link, is_error) = call_tool(&mut server, "provider_connect", json!({"provider": "google_fit"})).await;
        assert!(!is_error);
        assert!(link.contains("client_id=google-client"));

        let (fitbit, is_error) = call_tool(&mut server, "provider_connect", json!({"provider": "fitbit"})).await;
        assert!(is_error);
        assert!(fitbit.contains("not configured"));

        let (connected, is_error) = call_tool(
            &mut server,
            "provider_callback",
            json!({"provider": "google_fit", "fragment": "access_token=tok&expires_in=3600"}),
        )
        .await;
        assert!(!is_error, "{}", connected);

        let (status, _) = call_tool(&mut server, "provider_status", json!({})).await;
        assert!(status.contains("Google Fit: connected"));
        assert!(status.contains("Fitbit: not configured"));
    }

    #[tokio::test]
    async fn test_callback_with_out_of_range_expiry_keeps_serving() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (text, is_error) = call_tool(
            &mut server,
            "provider_callback",
            json!({"provider": "google_fit", "fragment": "access_token=abc&expires_in=9223372036854775807"}),
        )
        .await;
        assert!(is_error);
        assert!(text.contains("expires_in out of range"));

        let (status, _) = call_tool(&mut server, "provider_status", json!({})).await;
        assert!(status.contains("Google Fit: not connected"));
    }

    #[tokio::test]
    async fn test_insights_window_is_bounded() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (text, is_error) = call_tool(&mut server, "health_insights", json!({"days": 100000})).await;
        assert!(is_error);
        assert!(text.contains("days must be between 1 and 365"));
    }

    #[tokio::test]
    async fn test_goals_round_trip() {
        let mut server = server_with(Arc::new(CannedGenerator));

        let (defaults, is_error) = call_tool(&mut server, "health_goals", json!({})).await;
        assert!(!is_error, "{}", defaults);
        assert!(defaults.contains("/10000 steps"));

        let (updated, is_error) = call_tool(&mut server, "health_goals", json!({"steps": 8000, "mindful": 15})).await;
        assert!(!is_error, "{}", updated);
        assert!(updated.contains("Updated 2 goals"));
        assert!(updated.contains("/8000 steps"));
        assert!(updated.contains("mindful"));

        let (invalid, is_error) = call_tool(&mut server, "health_goals", json!({"water": -1})).await;
        assert!(is_error);
        assert!(invalid.contains("must be positive"));
    }

    #[tokio::test]
    async fn test_ai_analysis() {
        let mut server = server_with(Arc::new(AnalystGenerator));
        let (text, is_error) = call_tool(&mut server, "health_analysis", json!({})).await;
        assert!(!is_error, "{}", text);
        assert!(text.contains("AI Health Analysis"));
        assert!(text.contains("⚠️ Low water"));

        let mut offline = server_with(Arc::new(DownGenerator));
        let (text, is_error) = call_tool(&mut offline, "health_analysis", json!({})).await;
        assert!(!is_error);
        assert!(text.contains("not available"));
    }
}

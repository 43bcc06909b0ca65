/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin
/// 2. Routes tool calls to the wellness tools
/// 3. Sends JSON-RPC responses to stdout

use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::tools::{self, ToolError};
use crate::{ServerError, WellnessTrackerServer};

/// Failure to run a tool call
enum CallError {
    /// Arguments did not match the tool's params type
    InvalidArguments(serde_json::Error),
    UnknownTool(String),
    Tool(ToolError),
}

impl From<ToolError> for CallError {
    fn from(e: ToolError) -> Self {
        CallError::Tool(e)
    }
}

fn parse_args<P: DeserializeOwned>(args: Value) -> Result<P, CallError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(CallError::InvalidArguments)
}

fn tool<P: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let input_schema = serde_json::to_value(schemars::schema_for!(P)).unwrap_or_else(|e| {
        warn!("Cannot serialize input schema of {}: {}", name, e);
        json!({"type": "object"})
    });
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Every tool the server offers
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool::<tools::LogMetricsParams>(
            "metrics_log",
            "Log health metrics (sleep, steps, water, mood, ...) for today or a given date. Reports newly unlocked achievements.",
        ),
        tool::<tools::SummaryParams>(
            "metrics_summary",
            "Latest values, 7-day totals, averages and trends for every tracked metric",
        ),
        tool::<tools::InsightsParams>(
            "health_insights",
            "Personalized insights and recommendations plus predictions for tomorrow",
        ),
        tool::<tools::AnalysisParams>(
            "health_analysis",
            "Ask the AI assistant to analyze your latest day of metrics against the day before",
        ),
        tool::<tools::AchievementsParams>("achievements_list", "List unlocked achievements and total points"),
        tool::<tools::GoalsParams>(
            "health_goals",
            "Show progress toward daily goals, optionally setting new targets first",
        ),
        tool::<tools::ProfileParams>(
            "profile_update",
            "Create or update the user profile used for personalized targets",
        ),
        tool::<tools::ChatParams>("health_chat", "Ask the AI health assistant a question about your data"),
        tool::<tools::ChatHistoryParams>("chat_history", "Show or clear the conversation with the health assistant"),
        tool::<tools::ConnectParams>(
            "provider_connect",
            "Get the authorization link for connecting Fitbit or Google Fit",
        ),
        tool::<tools::CallbackParams>(
            "provider_callback",
            "Finish connecting a provider with the code or URL fragment from its callback",
        ),
        tool::<tools::StatusParams>("provider_status", "Show which data providers are connected"),
    ]
}

/// MCP server that handles communication with Claude
pub struct McpServer {
    tracker: WellnessTrackerServer,
    /// Whether the client sent its initialized notification
    initialized: bool,
}

impl McpServer {
    pub fn new(tracker: WellnessTrackerServer) -> Self {
        Self {
            tracker,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request).await
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => to_response(id, &HashMap::from([("tools", tool_definitions())])),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification {}", other),
        }
    }

    fn handle_initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        match &params.client_info {
            Some(client) => info!("MCP client connected: {} {}", client.name, client.version),
            None => info!("MCP client connected"),
        }
        if let Some(version) = params.protocol_version.filter(|v| v != MCP_VERSION) {
            debug!("Client requested protocol {}, answering with {}", version, MCP_VERSION);
        }

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Wellness Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    async fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if !self.initialized {
            debug!("tools/call before the initialized notification");
        }

        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing parameters".to_string(), None);
            }
        };

        info!("Calling tool {}", tool_params.name);
        let result = match self.call_tool(&tool_params.name, tool_params.arguments).await {
            Ok(text) => ToolCallResult::success(text),
            Err(CallError::InvalidArguments(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid arguments for {}: {}", tool_params.name, e),
                    None,
                );
            }
            Err(CallError::UnknownTool(name)) => ToolCallResult::error(format!("Unknown tool: {}", name)),
            Err(CallError::Tool(e)) => {
                warn!("Tool {} failed: {}", tool_params.name, e);
                ToolCallResult::error(e.to_string())
            }
        };

        to_response(id, &result)
    }

    /// Run a tool and return its text output
    async fn call_tool(&self, name: &str, args: Value) -> Result<String, CallError> {
        let t = &self.tracker;
        match name {
            "health_chat" => {
                let params = parse_args(args)?;
                let response = tools::health_chat(t.storage(), t.cache(), t.assistant(), t.user_id(), params).await?;
                Ok(response.message)
            }
            "health_analysis" => {
                let params = parse_args(args)?;
                let response =
                    tools::analyze_health(t.storage(), t.cache(), t.assistant(), t.user_id(), params).await?;
                Ok(response.message)
            }
            "provider_callback" => {
                let params = parse_args(args)?;
                let response =
                    tools::complete_provider_callback(t.storage(), t.config(), t.fitbit(), t.user_id(), params)
                        .await?;
                Ok(response.message)
            }
            _ => self.call_sync_tool(name, args, Local::now().date_naive()),
        }
    }

    fn call_sync_tool(&self, name: &str, args: Value, today: NaiveDate) -> Result<String, CallError> {
        let t = &self.tracker;
        let mut rng = rand::thread_rng();
        let message = match name {
            "metrics_log" => {
                tools::log_metrics(t.storage(), t.cache(), t.user_id(), parse_args(args)?, today, &mut rng)?.message
            }
            "metrics_summary" => {
                tools::summarize_metrics(t.storage(), t.cache(), t.user_id(), parse_args(args)?, today, &mut rng)?
                    .message
            }
            "health_insights" => {
                tools::get_health_insights(
                    t.storage(),
                    t.cache(),
                    t.analytics(),
                    t.user_id(),
                    parse_args(args)?,
                    today,
                    &mut rng,
                )?
                .message
            }
            "achievements_list" => tools::list_achievements(t.storage(), t.user_id(), parse_args(args)?)?.message,
            "health_goals" => tools::health_goals(t.storage(), t.user_id(), parse_args(args)?, today)?.message,
            "profile_update" => tools::update_profile(t.storage(), t.user_id(), parse_args(args)?)?.message,
            "chat_history" => tools::chat_history(t.storage(), t.user_id(), parse_args(args)?)?.message,
            "provider_connect" => tools::connect_provider(t.config(), parse_args(args)?)?.message,
            "provider_status" => tools::provider_status(t.storage(), t.config(), t.user_id(), parse_args(args)?)?.message,
            other => return Err(CallError::UnknownTool(other.to_string())),
        };
        Ok(message)
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, format!("Serialization failed: {}", e), None)
        }
    }
}

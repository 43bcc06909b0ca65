/// Tools for the health assistant conversation
///
/// This module implements the health_chat and chat_history MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assistant::{Assistant, PromptContext, ERROR_REPLY};
use crate::cache::TtlCache;
use crate::domain::{ChatMessage, HealthMetricRecord, Sender, UserId};
use crate::storage::WellnessStorage;
use crate::tools::{load_goals, load_history, ToolError};

/// Days of metrics sent to the assistant as context
const CONTEXT_DAYS: u32 = 7;

/// Parameters for asking the assistant
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatParams {
    /// Question or message for the health assistant
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    /// False when the fallback reply was used
    pub answered: bool,
}

/// Ask the assistant with the user's recent metrics, profile and goals as context
///
/// Both the question and the reply are appended to the chat history. When
/// every attempt fails the fixed apology is stored and returned instead.
pub async fn health_chat<S: WellnessStorage>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    assistant: &Assistant,
    user_id: &UserId,
    params: ChatParams,
) -> Result<ChatResponse, ToolError> {
    let query = params.message.trim();
    if query.is_empty() {
        return Err(ToolError::InvalidInput("Message cannot be empty".to_string()));
    }

    let context = PromptContext::new(
        load_history(storage, cache, user_id, CONTEXT_DAYS)?,
        storage.get_profile(user_id)?,
    )
    .with_goals(load_goals(storage, user_id)?);
    storage.append_chat_message(user_id, &ChatMessage::new(Sender::User, query))?;

    let (reply, answered) = match assistant.ask(query, &context).await {
        Ok(reply) => (reply, true),
        Err(e) => {
            tracing::warn!("Assistant failed for {}: {}", user_id, e);
            (ERROR_REPLY.to_string(), false)
        }
    };

    storage.append_chat_message(user_id, &ChatMessage::new(Sender::Assistant, reply.as_str()))?;

    Ok(ChatResponse {
        message: reply,
        answered,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatHistoryAction {
    #[default]
    List,
    Clear,
}

/// Parameters for reading or clearing the chat history
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ChatHistoryParams {
    /// list (default) or clear
    pub action: Option<ChatHistoryAction>,
    /// Only show the last N messages
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub message: String,
    pub messages: Vec<ChatMessage>,
    pub cleared: usize,
}

pub fn chat_history<S: WellnessStorage>(
    storage: &S,
    user_id: &UserId,
    params: ChatHistoryParams,
) -> Result<ChatHistoryResponse, ToolError> {
    match params.action.unwrap_or_default() {
        ChatHistoryAction::Clear => {
            let cleared = storage.clear_chat_history(user_id)?;
            tracing::info!("Cleared {} chat messages for {}", cleared, user_id);
            Ok(ChatHistoryResponse {
                message: format!("🧹 Cleared {} message{}", cleared, if cleared == 1 { "" } else { "s" }),
                messages: Vec::new(),
                cleared,
            })
        }
        ChatHistoryAction::List => {
            let messages = storage.get_chat_history(user_id, params.limit)?;
            let message = if messages.is_empty() {
                "💬 No conversation yet. Ask the health assistant anything!".to_string()
            } else {
                messages
                    .iter()
                    .map(|m| {
                        let who = match m.sender {
                            Sender::User => "You",
                            Sender::Assistant => "Assistant",
                        };
                        format!("[{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M"), who, m.content)
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            };
            Ok(ChatHistoryResponse {
                message,
                messages,
                cleared: 0,
            })
        }
    }
}

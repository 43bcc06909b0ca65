//! Conversational health assistant
//!
//! Composes a prompt from the user's data, calls the generative endpoint with
//! a bounded retry, and formats whatever comes back for display. It can also
//! ask for a structured analysis of the latest day.

pub mod client;
pub mod formatter;
pub mod prompt;
pub mod retry;

pub use client::{GeminiClient, TextGenerator};
pub use formatter::{format_external_text, parse_payload, render, ExternalInsight, ParsedInsightPayload};
pub use prompt::{compose_analysis_prompt, compose_prompt, PromptContext};
pub use retry::{linear_backoff, retry_with_backoff, DEFAULT_MAX_ATTEMPTS};

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{HealthMetricRecord, InsightKind, InsightRecord, UserProfile};

/// Priority given to analysis insights that do not state one
pub const DEFAULT_ANALYSIS_PRIORITY: u8 = 3;

/// Reply used when every attempt failed
pub const ERROR_REPLY: &str = "I apologize, but I encountered an error. Please try again.";

/// Reply used when the response formats to nothing
pub const EMPTY_REPLY: &str =
    "I apologize, but I couldn't generate a proper response. Please try asking your question differently.";

/// Errors from the generative endpoint
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Empty response from AI")]
    EmptyResponse,

    #[error("Failed to generate a response after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Assistant service wrapping a text generator
#[derive(Clone)]
pub struct Assistant {
    generator: Arc<dyn TextGenerator>,
    max_attempts: u32,
    backoff: fn(u32) -> Duration,
}

impl Assistant {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: linear_backoff,
        }
    }

    /// Override the retry policy
    pub fn with_retry(mut self, max_attempts: u32, backoff: fn(u32) -> Duration) -> Self {
        self.max_attempts = max_attempts;
        self.backoff = backoff;
        self
    }

    /// Ask a question and return the formatted reply
    pub async fn ask(&self, query: &str, context: &PromptContext) -> Result<String, AssistantError> {
        let prompt = compose_prompt(query, context);
        debug!("Composed prompt of {} chars", prompt.len());

        let generator = &self.generator;
        let prompt = prompt.as_str();
        let raw = retry_with_backoff(self.max_attempts, self.backoff, |_| async move {
            let text = generator.generate(prompt).await?;
            if text.trim().is_empty() {
                return Err(AssistantError::EmptyResponse);
            }
            Ok(text)
        })
        .await
        .map_err(|e| AssistantError::Exhausted {
            attempts: self.max_attempts.max(1),
            last: e.to_string(),
        })?;

        let formatted = format_external_text(&raw);
        info!("Assistant replied with {} chars", formatted.len());
        if formatted.trim().is_empty() {
            return Ok(EMPTY_REPLY.to_string());
        }
        Ok(formatted)
    }
}

impl Assistant {
    /// Ask for a structured analysis of the most recent day
    ///
    /// `history` is most recent first. The endpoint is called once; any
    /// failure, including a response that is not a list of insights, yields
    /// an empty list.
    pub async fn analyze(&self, history: &[HealthMetricRecord], profile: Option<&UserProfile>) -> Vec<InsightRecord> {
        let prompt = compose_analysis_prompt(history.first(), history.get(1), profile);

        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Health analysis failed: {}", e);
                return Vec::new();
            }
        };

        match parse_payload(&raw) {
            ParsedInsightPayload::ListForm(insights) | ParsedInsightPayload::WrappedForm(insights) => {
                info!("Health analysis returned {} insight(s)", insights.len());
                insights.into_iter().map(analysis_insight).collect()
            }
            _ => {
                warn!("Health analysis response is not a list of insights");
                Vec::new()
            }
        }
    }
}

/// Fill the fields the endpoint may leave out
fn analysis_insight(insight: ExternalInsight) -> InsightRecord {
    let kind = match insight.kind.as_deref() {
        Some("success") => InsightKind::Success,
        Some("warning") => InsightKind::Warning,
        _ => InsightKind::Info,
    };
    let priority = match insight.priority {
        Some(p) if p.is_finite() && p >= 1.0 => p.round().min(5.0) as u8,
        _ => DEFAULT_ANALYSIS_PRIORITY,
    };

    InsightRecord {
        id: insight
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("insight-{}", uuid::Uuid::new_v4())),
        kind,
        title: insight.title,
        description: insight.description,
        recommendation: insight.recommendation,
        priority,
        metric: None,
        direction: None,
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

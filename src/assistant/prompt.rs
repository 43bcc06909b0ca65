//! Prompt composition for the generative endpoint

use serde::Serialize;
use serde_json::Value;

use crate::domain::{HealthGoal, HealthMetricRecord, UserProfile};

const INSTRUCTIONS: &str = r#"Instructions:
You are a helpful AI health assistant. Analyze the context and user query to provide a detailed response.
If analyzing health metrics, format your response as JSON with an insights array. Otherwise, provide a natural conversational response.

For health analysis, use this format:
{
  "insights": [
    {
      "type": "success" | "warning" | "info",
      "title": "Brief insight title",
      "description": "Detailed explanation",
      "recommendation": "actionable suggestion"
    }
  ]
}

For general responses, provide clear explanations and specific recommendations when appropriate."#;

/// User data sent along with a question
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    pub metrics: Vec<HealthMetricRecord>,
    pub profile: Option<UserProfile>,
    pub goals: Vec<HealthGoal>,
}

impl PromptContext {
    pub fn new(metrics: Vec<HealthMetricRecord>, profile: Option<UserProfile>) -> Self {
        Self {
            metrics,
            profile,
            goals: Vec::new(),
        }
    }

    pub fn with_goals(mut self, goals: Vec<HealthGoal>) -> Self {
        self.goals = goals;
        self
    }

    /// Context fields as `(name, json)` pairs, skipping null values
    fn lines(&self) -> Vec<String> {
        let fields = [
            ("metrics", serde_json::to_value(&self.metrics)),
            ("profile", serde_json::to_value(&self.profile)),
            ("goals", serde_json::to_value(&self.goals)),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| match value {
                Ok(Value::Null) => None,
                Ok(value) => Some(format!("{}: {}", key, value)),
                Err(e) => {
                    tracing::warn!("Skipping unserializable context field {}: {}", key, e);
                    None
                }
            })
            .collect()
    }
}

/// Build the full prompt: context lines, the user's query and the fixed
/// formatting instructions
pub fn compose_prompt(query: &str, context: &PromptContext) -> String {
    format!(
        "Context:\n{}\n\nUser Query:\n{}\n\n{}",
        context.lines().join("\n"),
        query.trim(),
        INSTRUCTIONS
    )
}

const ANALYSIS_FOCUS: &str = r#"Provide a detailed analysis focusing on:
1. Sleep patterns and quality
2. Physical activity and exercise
3. Hydration levels
4. Mood and stress levels
5. Overall health trends

Format your response as a JSON array of insights, where each insight has:
- id: unique string
- type: "success", "warning", or "info"
- title: short descriptive title
- description: detailed explanation
- recommendation: actionable advice (optional)
- priority: number 1-5 (1 being highest priority)

Focus on actionable insights and personalized recommendations."#;

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Prompt asking for a JSON array of insights about the latest day
///
/// `latest` and `previous` are the two most recent records; either may be
/// missing and is then sent as `null`.
pub fn compose_analysis_prompt(
    latest: Option<&HealthMetricRecord>,
    previous: Option<&HealthMetricRecord>,
    profile: Option<&UserProfile>,
) -> String {
    format!(
        "As a health and wellness AI assistant, analyze this health data and provide insights:\n\n\
         Recent Health Metrics:\n{}\n\n\
         User Profile:\n{}\n\n\
         Previous Day's Metrics:\n{}\n\n{}",
        pretty(&latest),
        pretty(&profile),
        pretty(&previous),
        ANALYSIS_FOCUS
    )
}

/// Tools for health insights
///
/// This module implements the health_insights MCP tool, which combines the
/// insight rules with the next-day predictions, and the health_analysis tool,
/// which asks the assistant to analyze the latest day.

use chrono::NaiveDate;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, HealthReport, Prediction};
use crate::assistant::Assistant;
use crate::cache::TtlCache;
use crate::domain::{HealthMetricRecord, InsightRecord, UserId};
use crate::storage::WellnessStorage;
use crate::tools::{ensure_seeded, history_days, invalidate_history, load_history, ToolError};

/// Parameters for the insights tool
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct InsightsParams {
    /// Number of most recent days to analyze (1-365), defaults to 30
    pub days: Option<u32>,
    /// Include next-day predictions (default: true)
    pub include_predictions: Option<bool>,
}

/// Response with the rendered report
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub message: String,
    pub report: HealthReport,
}

/// Build insights and predictions for the user's recent history
pub fn get_health_insights<S: WellnessStorage, R: Rng + ?Sized>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    analytics: &AnalyticsEngine,
    user_id: &UserId,
    params: InsightsParams,
    today: NaiveDate,
    rng: &mut R,
) -> Result<InsightsResponse, ToolError> {
    let days = history_days(params.days)?;

    if ensure_seeded(storage, user_id, today, rng)? {
        invalidate_history(cache, user_id);
    }
    let history = load_history(storage, cache, user_id, days)?;
    let profile = storage.get_profile(user_id)?;

    let mut report = analytics.report(&history, profile.as_ref());
    if !params.include_predictions.unwrap_or(true) {
        report.predictions.clear();
    }

    Ok(InsightsResponse {
        message: render_report(&report),
        report,
    })
}

/// Parameters for the AI analysis tool (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AnalysisParams {}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub message: String,
    pub insights: Vec<InsightRecord>,
}

/// Ask the assistant to analyze the latest day against the one before it
///
/// An unavailable assistant is not an error; the response then holds no
/// insights.
pub async fn analyze_health<S: WellnessStorage>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    assistant: &Assistant,
    user_id: &UserId,
    _params: AnalysisParams,
) -> Result<AnalysisResponse, ToolError> {
    let history = load_history(storage, cache, user_id, 2)?;
    let profile = storage.get_profile(user_id)?;

    let insights = assistant.analyze(&history, profile.as_ref()).await;

    let message = if insights.is_empty() {
        "🤖 AI analysis is not available right now. The health_insights tool still works offline.".to_string()
    } else {
        let blocks: Vec<String> = insights.iter().map(|i| i.render()).collect();
        format!("🤖 **AI Health Analysis**\n\n{}", blocks.join("\n\n"))
    };

    Ok(AnalysisResponse { message, insights })
}

fn render_report(report: &HealthReport) -> String {
    let mut sections = Vec::new();

    if report.insights.is_empty() {
        sections.push("🔍 Not enough data for insights yet. Keep logging for a few more days!".to_string());
    } else {
        let blocks: Vec<String> = report.insights.iter().map(|i| i.render()).collect();
        sections.push(format!("🔍 **Health Insights**\n\n{}", blocks.join("\n\n")));
    }

    if !report.predictions.is_empty() {
        let lines: Vec<String> = report.predictions.iter().map(render_prediction).collect();
        sections.push(format!("📈 **Tomorrow's Outlook**\n{}", lines.join("\n")));
    }

    sections.join("\n\n")
}

fn render_prediction(p: &Prediction) -> String {
    format!(
        "- {}: {:.1} {} ({} risk, {:.0}% confidence, {})\n  💡 {}",
        p.label,
        p.prediction,
        p.metric.unit(),
        p.risk.as_str(),
        p.confidence * 100.0,
        p.current_trend.as_str(),
        p.recommendation
    )
}

/// Tools for logging and summarizing daily metrics
///
/// This module implements the metrics_log and metrics_summary MCP tools.

use chrono::NaiveDate;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::analytics::{compute_statistics, evaluate_achievements, merge_unlocked, DerivedStatistics};
use crate::cache::TtlCache;
use crate::domain::{AchievementKind, AchievementRecord, HealthMetricRecord, MetricKey, MetricUpdate, UserId};
use crate::storage::{StorageError, WellnessStorage};
use crate::tools::{
    ensure_seeded, history_days, invalidate_history, load_history, parse_date, ToolError, DEFAULT_HISTORY_DAYS,
};

/// Parameters for logging metric values
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LogMetricsParams {
    /// Day to update (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
    /// Hours slept, 0-24
    pub sleep_hours: Option<f64>,
    pub steps: Option<u32>,
    pub calories: Option<u32>,
    /// Glasses of water
    pub water_glasses: Option<u32>,
    pub exercise_minutes: Option<u32>,
    /// Mood rating 1-5
    pub mood: Option<u8>,
    /// Stress rating 1-5, 1 is very low
    pub stress_level: Option<u8>,
    pub mindful_minutes: Option<u32>,
    /// Free-form daily reflection
    pub journal_entry: Option<String>,
}

impl LogMetricsParams {
    fn to_update(&self) -> MetricUpdate {
        MetricUpdate {
            sleep_hours: self.sleep_hours,
            steps: self.steps,
            calories: self.calories,
            water_glasses: self.water_glasses,
            exercise_minutes: self.exercise_minutes,
            mood: self.mood,
            stress_level: self.stress_level,
            mindful_minutes: self.mindful_minutes,
            journal_entry: self.journal_entry.clone(),
        }
    }
}

/// Response from logging metrics
#[derive(Debug, Serialize)]
pub struct LogMetricsResponse {
    pub success: bool,
    pub message: String,
    pub record: HealthMetricRecord,
    pub new_achievements: Vec<AchievementRecord>,
}

/// Merge the given values into a day's record and check for new achievements
///
/// A day without a record starts from seeded values.
pub fn log_metrics<S: WellnessStorage, R: Rng + ?Sized>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    user_id: &UserId,
    params: LogMetricsParams,
    today: NaiveDate,
    rng: &mut R,
) -> Result<LogMetricsResponse, ToolError> {
    let update = params.to_update();
    if update.is_empty() {
        return Err(ToolError::InvalidInput("Provide at least one metric value to log".to_string()));
    }
    let date = parse_date(params.date.as_deref(), today)?;

    ensure_seeded(storage, user_id, today, rng)?;

    let mut record = match storage.get_metric(user_id, date) {
        Ok(record) => record,
        Err(StorageError::MetricNotFound { .. }) => {
            tracing::debug!("No record for {} on {}, starting from seed", user_id, date);
            HealthMetricRecord::seeded(date, rng)
        }
        Err(e) => return Err(e.into()),
    };

    update.apply_to(&mut record)?;
    storage.upsert_metric(user_id, &record)?;
    invalidate_history(cache, user_id);

    let history = storage.get_metrics(user_id, Some(DEFAULT_HISTORY_DAYS))?;
    let unlocked: HashSet<AchievementKind> = storage
        .list_achievements(user_id)?
        .into_iter()
        .map(|a| a.kind)
        .collect();
    let fresh = merge_unlocked(&unlocked, evaluate_achievements(&history));
    let new_achievements = storage.unlock_achievements(user_id, &fresh)?;

    let mut message = format!("📝 Logged metrics for {}", date);
    for achievement in &new_achievements {
        message.push_str(&format!(
            "\n{} Achievement unlocked: {} ({}, {} pts)",
            achievement.icon,
            achievement.title,
            achievement.tier.as_str(),
            achievement.points
        ));
    }

    Ok(LogMetricsResponse {
        success: true,
        message,
        record,
        new_achievements,
    })
}

/// Parameters for the metrics summary
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SummaryParams {
    /// Number of most recent days to include, defaults to 30
    pub days: Option<u32>,
}

/// Response with derived statistics
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub message: String,
    pub statistics: DerivedStatistics,
}

/// Derived statistics over the most recent days
pub fn summarize_metrics<S: WellnessStorage, R: Rng + ?Sized>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    user_id: &UserId,
    params: SummaryParams,
    today: NaiveDate,
    rng: &mut R,
) -> Result<SummaryResponse, ToolError> {
    let days = history_days(params.days)?;

    if ensure_seeded(storage, user_id, today, rng)? {
        invalidate_history(cache, user_id);
    }
    let history = load_history(storage, cache, user_id, days)?;
    let statistics = compute_statistics(&history);

    Ok(SummaryResponse {
        message: render_statistics(&statistics),
        statistics,
    })
}

fn render_statistics(statistics: &DerivedStatistics) -> String {
    let mut lines = vec![format!("📊 **Health Summary** ({} days)", statistics.record_count)];

    for (key, summary) in &statistics.metrics {
        let latest = summary
            .latest
            .map(|v| format_value(*key, v))
            .unwrap_or_else(|| "-".to_string());
        let average = summary
            .average
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "- {}: {} {} | avg {} | 7-day total {} | {}",
            key.display_name(),
            latest,
            key.unit(),
            average,
            format_value(*key, summary.weekly_sum),
            summary.trend.as_str()
        ));
    }

    lines.join("\n")
}

fn format_value(key: MetricKey, value: f64) -> String {
    match key {
        MetricKey::Sleep => format!("{:.1}", value),
        _ => format!("{}", value.round() as i64),
    }
}

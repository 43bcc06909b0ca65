/// Analytics engine for statistics, insights, achievements and predictions
///
/// Every function in this module is pure: it reads a most-recent-first slice
/// of metric records and returns fresh values. Nothing here touches storage.

pub mod achievements;
pub mod insights;
pub mod predict;
pub mod statistics;

pub use achievements::{evaluate_achievements, evaluate_achievements_at, merge_unlocked};
pub use insights::generate_insights;
pub use predict::{predict_trends, Prediction, RiskLevel};
pub use statistics::{compute_statistics, DerivedStatistics, MetricSummary};

use serde::Serialize;

use crate::domain::{HealthMetricRecord, InsightRecord, UserProfile};

/// Everything the insights view shows for one user
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub insights: Vec<InsightRecord>,
    pub predictions: Vec<Prediction>,
    pub statistics: DerivedStatistics,
}

/// Analytics engine for processing metric histories
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Summary statistics for the given history
    pub fn summarize(&self, metrics: &[HealthMetricRecord]) -> DerivedStatistics {
        compute_statistics(metrics)
    }

    /// Build the full report: rule-based insights, predictions and statistics
    pub fn report(&self, metrics: &[HealthMetricRecord], profile: Option<&UserProfile>) -> HealthReport {
        HealthReport {
            insights: generate_insights(metrics, profile),
            predictions: predict_trends(metrics),
            statistics: compute_statistics(metrics),
        }
    }
}

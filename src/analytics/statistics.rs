//! Derived statistics over a metric history
//!
//! Everything here is a pure function of a most-recent-first slice of
//! records. Nothing is persisted; statistics are recomputed on every read.

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{DeadBand, HealthMetricRecord, MetricKey, Polarity, Trend};

/// Records per trend window; the trend compares the first two windows
pub const TREND_WINDOW: usize = 3;

/// Length of the weekly-sum window in calendar days
pub const WEEK_DAYS: i64 = 7;

/// Summary of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Value on the most recent day, if recorded
    pub latest: Option<f64>,
    /// Sum over the 7 calendar days ending at the most recent record
    pub weekly_sum: f64,
    /// Mean over the whole input, rounded to one decimal
    pub average: Option<f64>,
    pub trend: Trend,
}

/// Per-metric summaries, keyed in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStatistics {
    /// Number of records the statistics were computed over
    pub record_count: usize,
    pub metrics: BTreeMap<MetricKey, MetricSummary>,
}

impl DerivedStatistics {
    pub fn get(&self, key: MetricKey) -> Option<&MetricSummary> {
        self.metrics.get(&key)
    }
}

/// Compute summaries for every tracked metric
pub fn compute_statistics(metrics: &[HealthMetricRecord]) -> DerivedStatistics {
    let summaries = MetricKey::ALL
        .iter()
        .map(|&key| {
            let summary = MetricSummary {
                latest: metrics.first().and_then(|m| m.value(key)),
                weekly_sum: weekly_sum_of(metrics, key),
                average: average_of(metrics, key),
                trend: trend_of(metrics, key),
            };
            (key, summary)
        })
        .collect();

    DerivedStatistics {
        record_count: metrics.len(),
        metrics: summaries,
    }
}

/// Arithmetic mean of the recorded values, rounded to one decimal
///
/// Optional fields only count the records where they are present.
pub fn average_of(metrics: &[HealthMetricRecord], key: MetricKey) -> Option<f64> {
    let values: Vec<f64> = metrics.iter().filter_map(|m| m.value(key)).collect();
    if values.is_empty() {
        return None;
    }
    Some(round1(mean(&values)))
}

/// Sum over the records dated within the last week of the sequence
pub fn weekly_sum_of(metrics: &[HealthMetricRecord], key: MetricKey) -> f64 {
    let Some(latest) = metrics.first() else {
        return 0.0;
    };
    let window_start = latest.date - Duration::days(WEEK_DAYS - 1);

    metrics
        .iter()
        .filter(|m| m.date >= window_start && m.date <= latest.date)
        .filter_map(|m| m.value(key))
        .sum()
}

/// Compare the mean of the 3 most recent records with the 3 before them
///
/// Returns `Stable` when there are fewer than 6 records or when an optional
/// field is missing in either window.
pub fn trend_of(metrics: &[HealthMetricRecord], key: MetricKey) -> Trend {
    if metrics.len() < TREND_WINDOW * 2 {
        return Trend::Stable;
    }

    let values: Option<Vec<f64>> = metrics[..TREND_WINDOW * 2].iter().map(|m| m.value(key)).collect();
    match values {
        Some(values) => classify_trend(&values, key),
        None => Trend::Stable,
    }
}

/// Trend of a plain value series, most recent first
pub fn classify_trend(values: &[f64], key: MetricKey) -> Trend {
    if values.len() < TREND_WINDOW * 2 {
        return Trend::Stable;
    }

    let recent = mean(&values[..TREND_WINDOW]);
    let prior = mean(&values[TREND_WINDOW..TREND_WINDOW * 2]);
    let diff = recent - prior;

    let stable = match key.dead_band() {
        DeadBand::Absolute(band) => diff.abs() < band,
        DeadBand::Relative(fraction) => {
            if prior == 0.0 {
                recent == 0.0
            } else {
                diff.abs() < fraction * prior.abs()
            }
        }
    };
    if stable {
        return Trend::Stable;
    }

    match (key.polarity(), diff > 0.0) {
        (Polarity::HigherIsBetter, true) | (Polarity::LowerIsBetter, false) => Trend::Improving,
        _ => Trend::Declining,
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//! Next-day predictions from a one-week least-squares fit

use serde::Serialize;

use crate::analytics::statistics::{classify_trend, mean};
use crate::domain::{HealthMetricRecord, MetricKey, Trend};

/// Number of days the fit runs over
pub const PREDICTION_WINDOW: usize = 7;

/// Stress level assumed for days without one
const DEFAULT_STRESS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub metric: MetricKey,
    pub label: &'static str,
    pub current_trend: Trend,
    /// Predicted value for the day after the latest record
    pub prediction: f64,
    pub confidence: f64,
    pub risk: RiskLevel,
    pub recommendation: &'static str,
}

/// Predict sleep, stress and exercise for the next day
///
/// Needs at least a week of most-recent-first records, otherwise returns
/// nothing.
pub fn predict_trends(metrics: &[HealthMetricRecord]) -> Vec<Prediction> {
    if metrics.len() < PREDICTION_WINDOW {
        return Vec::new();
    }
    let week = &metrics[..PREDICTION_WINDOW];

    [
        (MetricKey::Sleep, "Sleep Quality"),
        (MetricKey::Stress, "Stress Level"),
        (MetricKey::Exercise, "Exercise Consistency"),
    ]
    .into_iter()
    .map(|(key, label)| {
        let values: Vec<f64> = week
            .iter()
            .map(|m| match key {
                MetricKey::Stress => m.value(key).unwrap_or(DEFAULT_STRESS),
                _ => m.value(key).unwrap_or(0.0),
            })
            .collect();
        let (prediction, confidence) = fit_next(&values);
        let risk = risk_level(key, prediction);

        Prediction {
            metric: key,
            label,
            current_trend: classify_trend(&values, key),
            prediction,
            confidence,
            risk,
            recommendation: recommendation(key, risk),
        }
    })
    .collect()
}

/// Least-squares fit over most-recent-first `values`, evaluated one step past
/// the latest value. Returns `(prediction, confidence)`.
pub fn fit_next(values: &[f64]) -> (f64, f64) {
    let chronological: Vec<f64> = values.iter().rev().copied().collect();
    let n = chronological.len();
    if n == 0 {
        return (0.0, 0.5);
    }

    let xs: Vec<f64> = (0..n).map(|x| x as f64).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(&chronological);

    let mut covariance = 0.0;
    let mut x_spread = 0.0;
    for (x, y) in xs.iter().zip(&chronological) {
        covariance += (x - x_mean) * (y - y_mean);
        x_spread += (x - x_mean).powi(2);
    }
    let slope = if x_spread == 0.0 { 0.0 } else { covariance / x_spread };
    let intercept = y_mean - slope * x_mean;
    let prediction = intercept + slope * n as f64;

    let variance = chronological.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>() / n as f64;
    let confidence = if prediction == 0.0 {
        0.5
    } else {
        1.0 - (variance / prediction.abs()).min(0.5)
    };

    (prediction, confidence)
}

pub fn risk_level(key: MetricKey, prediction: f64) -> RiskLevel {
    match key {
        MetricKey::Sleep if prediction < 6.0 => RiskLevel::High,
        MetricKey::Sleep if prediction < 7.0 => RiskLevel::Medium,
        MetricKey::Stress if prediction > 4.0 => RiskLevel::High,
        MetricKey::Stress if prediction > 3.0 => RiskLevel::Medium,
        MetricKey::Exercise if prediction < 15.0 => RiskLevel::High,
        MetricKey::Exercise if prediction < 30.0 => RiskLevel::Medium,
        MetricKey::Sleep | MetricKey::Stress | MetricKey::Exercise => RiskLevel::Low,
        _ => RiskLevel::Medium,
    }
}

fn recommendation(key: MetricKey, risk: RiskLevel) -> &'static str {
    match (key, risk) {
        (MetricKey::Sleep, RiskLevel::High) => "Your sleep pattern shows a concerning trend. Consider setting a consistent bedtime, avoiding screens before bed and creating a relaxing bedtime routine.",
        (MetricKey::Sleep, RiskLevel::Medium) => "Your sleep could be improved. Try limiting caffeine after 2 PM and keeping your bedroom cool and dark.",
        (MetricKey::Sleep, RiskLevel::Low) => "Your sleep pattern is healthy. Keep maintaining your good sleep habits!",
        (MetricKey::Stress, RiskLevel::High) => "High stress levels predicted. Consider daily meditation, regular exercise and possibly consulting a wellness professional.",
        (MetricKey::Stress, RiskLevel::Medium) => "Moderate stress levels expected. Try breathing exercises and short breaks throughout your day.",
        (MetricKey::Stress, RiskLevel::Low) => "Your stress management is effective. Continue your current wellness practices.",
        (_, RiskLevel::High) => "Exercise levels are trending low. Try scheduling short workouts and setting realistic daily movement goals.",
        (_, RiskLevel::Medium) => "Moderate activity level predicted. Consider increasing the intensity or duration of your workouts gradually.",
        (_, RiskLevel::Low) => "Great exercise consistency! Keep up your current routine while watching for signs of overtraining.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn week(sleep: [f64; 7], exercise: [u32; 7], stress: [Option<u8>; 7]) -> Vec<HealthMetricRecord> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        (0..7)
            .map(|i| HealthMetricRecord {
                date: today - Duration::days(i as i64),
                sleep_hours: sleep[i],
                steps: 8000,
                calories: 2000,
                water_glasses: 8,
                exercise_minutes: exercise[i],
                mood: 3,
                stress_level: stress[i],
                mindful_minutes: None,
                journal_entry: None,
            })
            .collect()
    }

    #[test]
    fn test_needs_a_full_week() {
        let mut metrics = week([7.0; 7], [30; 7], [Some(2); 7]);
        metrics.pop();
        assert!(predict_trends(&metrics).is_empty());
    }

    #[test]
    fn test_constant_series_predicts_itself() {
        let (prediction, confidence) = fit_next(&[7.0; 7]);
        assert!((prediction - 7.0).abs() < 1e-9);
        assert!((confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_series_extrapolates() {
        // most recent first: 40, 35, ..., 10 -> next is 45
        let values = [40.0, 35.0, 30.0, 25.0, 20.0, 15.0, 10.0];
        let (prediction, confidence) = fit_next(&values);
        assert!((prediction - 45.0).abs() < 1e-9);
        // variance 100 / 45 is clamped at 0.5
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_prediction_has_half_confidence() {
        assert_eq!(fit_next(&[0.0; 7]), (0.0, 0.5));
    }

    #[test]
    fn test_predictions_cover_three_metrics() {
        let metrics = week([5.0; 7], [40, 35, 30, 25, 20, 15, 10], [None; 7]);
        let predictions = predict_trends(&metrics);

        let keys: Vec<MetricKey> = predictions.iter().map(|p| p.metric).collect();
        assert_eq!(keys, vec![MetricKey::Sleep, MetricKey::Stress, MetricKey::Exercise]);

        assert_eq!(predictions[0].risk, RiskLevel::High);
        // missing stress is treated as 3
        assert!((predictions[1].prediction - 3.0).abs() < 1e-9);
        assert_eq!(predictions[1].risk, RiskLevel::Low);
        assert_eq!(predictions[2].risk, RiskLevel::Low);
        assert_eq!(predictions[2].current_trend, Trend::Improving);
    }

    #[test]
    fn test_risk_boundaries() {
        assert_eq!(risk_level(MetricKey::Sleep, 6.0), RiskLevel::Medium);
        assert_eq!(risk_level(MetricKey::Sleep, 7.0), RiskLevel::Low);
        assert_eq!(risk_level(MetricKey::Stress, 4.5), RiskLevel::High);
        assert_eq!(risk_level(MetricKey::Stress, 3.0), RiskLevel::Low);
        assert_eq!(risk_level(MetricKey::Exercise, 14.9), RiskLevel::High);
        assert_eq!(risk_level(MetricKey::Exercise, 29.0), RiskLevel::Medium);
    }
}

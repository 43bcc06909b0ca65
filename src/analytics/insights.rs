//! Rule-based insight generation
//!
//! Compares the most recent day with the one before it against fixed or
//! profile-personalized thresholds.

use crate::domain::{
    Direction, HealthMetricRecord, InsightKind, InsightRecord, MetricKey, UserProfile,
    DEFAULT_SLEEP_TARGET, DEFAULT_STEPS_TARGET,
};

/// Daily water goal in glasses
pub const WATER_TARGET: u32 = 8;
/// Exercise minutes above which the day counts as a success
pub const EXERCISE_SUCCESS_MINUTES: u32 = 30;
/// Mood ratings below this trigger wellness support
pub const LOW_MOOD_THRESHOLD: u8 = 3;

/// Generate prioritized insights for the latest day
///
/// `metrics` is most-recent-first. At least two records are needed; fewer
/// yields an empty list. The result is sorted by ascending priority, keeping
/// rule order for ties.
pub fn generate_insights(metrics: &[HealthMetricRecord], profile: Option<&UserProfile>) -> Vec<InsightRecord> {
    let (recent, previous) = match metrics {
        [recent, previous, ..] => (recent, previous),
        _ => return Vec::new(),
    };

    let sleep_target = profile.map_or(DEFAULT_SLEEP_TARGET, UserProfile::sleep_target);
    let steps_target = profile.map_or(DEFAULT_STEPS_TARGET, UserProfile::steps_target);

    let mut insights = Vec::new();

    if recent.sleep_hours < sleep_target {
        insights.push(InsightRecord {
            id: "sleep_warning".to_string(),
            kind: InsightKind::Warning,
            title: "Sleep Duration Below Target".to_string(),
            description: format!(
                "You slept {} hours last night. Aim for {}-9 hours for optimal health.",
                format_hours(recent.sleep_hours),
                sleep_target
            ),
            recommendation: Some(
                "Try to maintain a consistent sleep schedule and avoid screens before bedtime.".to_string(),
            ),
            priority: 1,
            metric: Some(MetricKey::Sleep),
            direction: Some(direction(recent.sleep_hours, previous.sleep_hours)),
        });
    }

    if recent.steps < steps_target {
        insights.push(InsightRecord {
            id: "steps_warning".to_string(),
            kind: InsightKind::Warning,
            title: "Step Count Below Target".to_string(),
            description: format!(
                "You took {} steps. Aim for {} steps daily.",
                thousands(recent.steps),
                thousands(steps_target)
            ),
            recommendation: Some(
                "Try taking short walks during breaks or using stairs instead of elevator.".to_string(),
            ),
            priority: 2,
            metric: Some(MetricKey::Steps),
            direction: Some(direction(f64::from(recent.steps), f64::from(previous.steps))),
        });
    }

    if recent.water_glasses < WATER_TARGET {
        insights.push(InsightRecord {
            id: "hydration_warning".to_string(),
            kind: InsightKind::Warning,
            title: "Hydration Below Target".to_string(),
            description: format!(
                "You drank {} glasses of water. Aim for {} glasses daily.",
                recent.water_glasses, WATER_TARGET
            ),
            recommendation: Some("Set reminders to drink water throughout the day.".to_string()),
            priority: 3,
            metric: Some(MetricKey::Water),
            direction: Some(direction(
                f64::from(recent.water_glasses),
                f64::from(previous.water_glasses),
            )),
        });
    }

    if recent.exercise_minutes > EXERCISE_SUCCESS_MINUTES {
        insights.push(InsightRecord {
            id: "exercise_success".to_string(),
            kind: InsightKind::Success,
            title: "Exercise Goal Achieved".to_string(),
            description: format!("Great job! You exercised for {} minutes.", recent.exercise_minutes),
            recommendation: None,
            priority: 4,
            metric: Some(MetricKey::Exercise),
            direction: Some(Direction::Up),
        });
    }

    if recent.mood < LOW_MOOD_THRESHOLD {
        insights.push(InsightRecord {
            id: "mood_support".to_string(),
            kind: InsightKind::Info,
            title: "Mood Support".to_string(),
            description: "Your mood seems lower than usual.".to_string(),
            recommendation: Some(
                "Consider trying some mindfulness exercises or reaching out to talk to someone.".to_string(),
            ),
            priority: 1,
            metric: Some(MetricKey::Mood),
            direction: None,
        });
    }

    // sort_by_key is stable
    insights.sort_by_key(|insight| insight.priority);
    insights
}

fn direction(recent: f64, previous: f64) -> Direction {
    if recent > previous {
        Direction::Up
    } else {
        Direction::Down
    }
}

fn format_hours(hours: f64) -> String {
    let rounded = (hours * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// 12000 -> "12,000"
pub(crate) fn thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityLevel, Gender};
    use chrono::NaiveDate;

    fn record(day: u32, sleep: f64, steps: u32, water: u32, exercise: u32, mood: u8) -> HealthMetricRecord {
        HealthMetricRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            sleep_hours: sleep,
            steps,
            calories: 2000,
            water_glasses: water,
            exercise_minutes: exercise,
            mood,
            stress_level: None,
            mindful_minutes: None,
            journal_entry: None,
        }
    }

    fn healthy(day: u32) -> HealthMetricRecord {
        record(day, 8.5, 11000, 9, 20, 4)
    }

    #[test]
    fn test_fewer_than_two_records_is_empty() {
        assert!(generate_insights(&[], None).is_empty());
        assert!(generate_insights(&[record(2, 4.0, 100, 1, 0, 1)], None).is_empty());
    }

    #[test]
    fn test_short_sleep_gives_priority_one_warning() {
        let metrics = vec![record(2, 5.0, 11000, 9, 20, 4), record(1, 6.0, 11000, 9, 20, 4)];
        let insights = generate_insights(&metrics, None);

        let sleep = insights.iter().find(|i| i.id == "sleep_warning").unwrap();
        assert_eq!(sleep.priority, 1);
        assert_eq!(sleep.kind, InsightKind::Warning);
        assert_eq!(sleep.direction, Some(Direction::Down));
        assert!(sleep.description.contains("5 hours"));
    }

    #[test]
    fn test_healthy_day_has_no_warnings() {
        let insights = generate_insights(&[healthy(2), healthy(1)], None);
        assert!(insights.is_empty());
    }

    #[test]
    fn test_output_is_sorted_by_priority() {
        let metrics = vec![record(2, 5.0, 3000, 2, 45, 1), record(1, 6.0, 4000, 3, 10, 3)];
        let insights = generate_insights(&metrics, None);

        let ids: Vec<&str> = insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["sleep_warning", "mood_support", "steps_warning", "hydration_warning", "exercise_success"]
        );
        assert!(insights.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_profile_personalizes_targets() {
        let older = UserProfile::new("Ada".to_string(), 70, 60.0, 165.0, Gender::Female, Some(ActivityLevel::Active))
            .unwrap();
        // 7.5h is fine for a 70 year old, 11000 steps is short of the active target
        let metrics = vec![record(2, 7.5, 11000, 9, 20, 4), healthy(1)];
        let insights = generate_insights(&metrics, Some(&older));

        assert!(insights.iter().all(|i| i.id != "sleep_warning"));
        let steps = insights.iter().find(|i| i.id == "steps_warning").unwrap();
        assert!(steps.description.contains("12,000"));
    }

    #[test]
    fn test_exercise_boundary() {
        let at_30 = generate_insights(&[record(2, 8.5, 11000, 9, 30, 4), healthy(1)], None);
        assert!(at_30.iter().all(|i| i.id != "exercise_success"));

        let at_31 = generate_insights(&[record(2, 8.5, 11000, 9, 31, 4), healthy(1)], None);
        assert!(at_31.iter().any(|i| i.id == "exercise_success"));
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(8000), "8,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}

/// Basic unit tests to verify core functionality
use chrono::{Duration, NaiveDate};
use wellness_tracker_mcp::analytics::{compute_statistics, evaluate_achievements, generate_insights};
use wellness_tracker_mcp::assistant::format_external_text;
use wellness_tracker_mcp::*;

/// Most-recent-first history where day `i` has the given steps and sleep
fn history(values: &[(u32, f64)]) -> Vec<HealthMetricRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, &(steps, sleep_hours))| HealthMetricRecord {
            date: start - Duration::days(i as i64),
            sleep_hours,
            steps,
            calories: 2000,
            water_glasses: 8,
            exercise_minutes: 35,
            mood: 4,
            stress_level: Some(2),
            mindful_minutes: None,
            journal_entry: None,
        })
        .collect()
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_average_is_arithmetic_mean() {
        let metrics = history(&[(9000, 7.0), (6000, 8.5), (7500, 6.0), (10100, 7.25)]);
        let stats = compute_statistics(&metrics);

        let steps = stats.get(MetricKey::Steps).unwrap();
        assert_eq!(steps.average, Some(8150.0));

        let sleep = stats.get(MetricKey::Sleep).unwrap();
        let mean = (7.0 + 8.5 + 6.0 + 7.25) / 4.0;
        assert!((sleep.average.unwrap() - mean).abs() <= 0.05);
        assert_eq!(stats.record_count, 4);
    }

    #[test]
    fn test_insights_need_two_records() {
        assert!(generate_insights(&[], None).is_empty());
        assert!(generate_insights(&history(&[(2000, 4.0)]), None).is_empty());
    }

    #[test]
    fn test_insights_sorted_by_priority() {
        let metrics = history(&[(3000, 5.0), (9000, 8.0), (8000, 7.5)]);
        let insights = generate_insights(&metrics, None);

        assert!(!insights.is_empty());
        assert!(insights.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_short_sleep_warning() {
        let metrics = history(&[(9000, 5.0), (9000, 7.0)]);
        let insights = generate_insights(&metrics, None);

        let warning = insights.iter().find(|i| i.id == "sleep_warning").unwrap();
        assert_eq!(warning.priority, 1);
        assert_eq!(warning.kind, InsightKind::Warning);
    }

    #[test]
    fn test_formatter_json_insights() {
        let text = format_external_text(r#"{"insights":[{"type":"warning","title":"T","description":"D"}]}"#);
        assert!(text.contains("⚠️"));
        assert!(text.contains('T'));
        assert!(text.contains('D'));
    }

    #[test]
    fn test_formatter_plain_bullets() {
        let text = format_external_text("- eat well\n- sleep more");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("• 💫 ")));
    }

    #[test]
    fn test_step_master_threshold() {
        let unlocked = |steps| {
            evaluate_achievements(&history(&[(steps, 7.0)]))
                .iter()
                .any(|a| a.kind == AchievementKind::StepMaster && a.title == "Step Master")
        };
        assert!(unlocked(10_000));
        assert!(!unlocked(9_999));
    }
}

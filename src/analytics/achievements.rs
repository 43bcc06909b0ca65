//! Achievement evaluation
//!
//! The evaluator is stateless: every call builds fresh records for every rule
//! whose threshold is met. Callers merge the result against what is already
//! unlocked with [`merge_unlocked`], keyed by [`AchievementKind`].

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::{AchievementKind, AchievementRecord, HealthMetricRecord};

/// Evaluate every rule against the latest record
pub fn evaluate_achievements(metrics: &[HealthMetricRecord]) -> Vec<AchievementRecord> {
    evaluate_achievements_at(metrics, Utc::now())
}

/// Same as [`evaluate_achievements`] with an explicit unlock time
pub fn evaluate_achievements_at(metrics: &[HealthMetricRecord], now: DateTime<Utc>) -> Vec<AchievementRecord> {
    let Some(today) = metrics.first() else {
        return Vec::new();
    };
    let previous = metrics.get(1);

    AchievementKind::ALL
        .iter()
        .copied()
        .filter(|kind| rule_met(*kind, today, previous))
        .map(|kind| AchievementRecord::unlock(kind, now))
        .collect()
}

fn rule_met(kind: AchievementKind, today: &HealthMetricRecord, previous: Option<&HealthMetricRecord>) -> bool {
    match kind {
        AchievementKind::StepMaster => today.steps >= 10_000,
        AchievementKind::WorkoutWarrior => today.exercise_minutes >= 30,
        AchievementKind::SleepChampion => today.sleep_hours >= 8.0,
        AchievementKind::HydrationHero => today.water_glasses >= 8,
        AchievementKind::MoodBooster => previous.is_some_and(|p| today.mood > p.mood),
        AchievementKind::ZenMaster => today.mindful_minutes.is_some_and(|m| m >= 10),
        AchievementKind::StressManager => today.stress_level.is_some_and(|s| s <= 2),
        AchievementKind::ReflectiveWriter => today
            .journal_entry
            .as_ref()
            .is_some_and(|j| j.chars().count() >= 100),
    }
}

/// Keep only the freshly evaluated achievements whose kind is not unlocked yet
///
/// Generated ids are random per evaluation and play no part here.
pub fn merge_unlocked(
    already_unlocked: &HashSet<AchievementKind>,
    fresh: Vec<AchievementRecord>,
) -> Vec<AchievementRecord> {
    let mut seen = already_unlocked.clone();
    fresh.into_iter().filter(|a| seen.insert(a.kind)).collect()
}

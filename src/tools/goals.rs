/// Tool for reading and setting daily health goals
///
/// This module implements the health_goals MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{default_goals, GoalKind, GoalProgress, HealthGoal, UserId};
use crate::storage::{StorageError, WellnessStorage};
use crate::tools::ToolError;

/// Parameters for the goals tool; omitted targets stay unchanged
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GoalsParams {
    /// Hours of sleep per night
    pub sleep: Option<f64>,
    /// Steps per day
    pub steps: Option<f64>,
    /// Glasses of water per day
    pub water: Option<f64>,
    /// Minutes of exercise per day
    pub exercise: Option<f64>,
    /// Calories per day
    pub calories: Option<f64>,
    /// Target body weight in kg
    pub weight: Option<f64>,
    /// Minutes of mindfulness per day
    pub mindful: Option<f64>,
}

impl GoalsParams {
    fn targets(&self) -> Vec<(GoalKind, f64)> {
        [
            (GoalKind::Sleep, self.sleep),
            (GoalKind::Steps, self.steps),
            (GoalKind::Water, self.water),
            (GoalKind::Exercise, self.exercise),
            (GoalKind::Calories, self.calories),
            (GoalKind::Weight, self.weight),
            (GoalKind::Mindful, self.mindful),
        ]
        .into_iter()
        .filter_map(|(kind, target)| target.map(|t| (kind, t)))
        .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub message: String,
    pub goals: Vec<GoalProgress>,
    pub updated: usize,
}

/// Stored goals, or the defaults for a user who never saved any
pub fn load_goals<S: WellnessStorage>(storage: &S, user_id: &UserId) -> Result<Vec<HealthGoal>, StorageError> {
    let goals = storage.get_goals(user_id)?;
    if goals.is_empty() {
        return Ok(default_goals());
    }
    Ok(goals)
}

/// Update any given targets, then report progress against today's record
pub fn health_goals<S: WellnessStorage>(
    storage: &S,
    user_id: &UserId,
    params: GoalsParams,
    today: NaiveDate,
) -> Result<GoalsResponse, ToolError> {
    let changes = params
        .targets()
        .into_iter()
        .map(|(kind, target)| HealthGoal::new(kind, target))
        .collect::<Result<Vec<_>, _>>()?;

    let mut goals = load_goals(storage, user_id)?;
    if !changes.is_empty() {
        for change in &changes {
            match goals.iter_mut().find(|g| g.kind == change.kind) {
                Some(goal) => goal.target = change.target,
                None => goals.push(change.clone()),
            }
        }
        // Defaults are stored together with the first change
        storage.save_goals(user_id, &goals)?;
        tracing::info!("Updated {} goal(s) for {}", changes.len(), user_id);
    }

    let record = match storage.get_metric(user_id, today) {
        Ok(record) => Some(record),
        Err(StorageError::MetricNotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let profile = storage.get_profile(user_id)?;

    let progress: Vec<GoalProgress> = goals
        .iter()
        .map(|goal| goal.progress(goal.kind.current(record.as_ref(), profile.as_ref())))
        .collect();

    let mut lines = Vec::with_capacity(progress.len() + 2);
    if !changes.is_empty() {
        lines.push(format!("✅ Updated {} goal{}", changes.len(), if changes.len() == 1 { "" } else { "s" }));
    }
    lines.push(format!("🎯 **Goals for {}**", today.format("%Y-%m-%d")));
    lines.extend(progress.iter().map(|p| {
        format!(
            "{} {} {} {}/{} {} ({:.0}%)",
            p.status.glyph(),
            p.kind,
            p.bar(),
            trim_number(p.current),
            trim_number(p.target),
            p.kind.unit(),
            p.percent
        )
    }));

    Ok(GoalsResponse {
        message: lines.join("\n"),
        goals: progress,
        updated: changes.len(),
    })
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, GoalStatus, HealthMetricRecord};
    use crate::storage::SqliteStorage;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_defaults_without_data() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let response = health_goals(&storage, &UserId::new("u"), GoalsParams::default(), day()).unwrap();

        assert_eq!(response.updated, 0);
        assert_eq!(response.goals.len(), 5);
        assert!(response.goals.iter().all(|g| g.current == 0.0 && g.status == GoalStatus::Behind));
        assert!(response.message.contains("🔴 steps ░░░░░░░░░░ 0/10000 steps (0%)"));
        // Defaults are not written until the user changes something
        assert!(storage.get_goals(&UserId::new("u")).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_progress() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = UserId::new("u");
        let record = HealthMetricRecord::new(day(), 7.5, 9000, 2100, 8, 15, 4, None, Some(10), None).unwrap();
        storage.upsert_metric(&user, &record).unwrap();

        let params = GoalsParams {
            steps: Some(12_000.0),
            mindful: Some(10.0),
            ..Default::default()
        };
        let response = health_goals(&storage, &user, params, day()).unwrap();

        assert_eq!(response.updated, 2);
        assert!(response.message.starts_with("✅ Updated 2 goals"));

        let steps = response.goals.iter().find(|g| g.kind == GoalKind::Steps).unwrap();
        assert_eq!((steps.current, steps.target, steps.status), (9000.0, 12_000.0, GoalStatus::Close));
        let water = response.goals.iter().find(|g| g.kind == GoalKind::Water).unwrap();
        assert_eq!(water.status, GoalStatus::Reached);
        let mindful = response.goals.iter().find(|g| g.kind == GoalKind::Mindful).unwrap();
        assert_eq!(mindful.percent, 100.0);

        let stored = storage.get_goals(&user).unwrap();
        assert_eq!(stored.len(), 6);
        assert_eq!(load_goals(&storage, &user).unwrap(), stored);
    }

    #[test]
    fn test_invalid_target_changes_nothing() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = UserId::new("u");
        let params = GoalsParams {
            sleep: Some(9.0),
            water: Some(0.0),
            ..Default::default()
        };

        let result = health_goals(&storage, &user, params, day());

        assert!(matches!(result, Err(ToolError::Domain(DomainError::InvalidValue { .. }))));
        assert!(storage.get_goals(&user).unwrap().is_empty());
    }
}

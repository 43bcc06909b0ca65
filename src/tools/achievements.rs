/// Tool for listing unlocked achievements
///
/// This module implements the achievements_list MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{AchievementKind, AchievementRecord, UserId};
use crate::storage::WellnessStorage;
use crate::tools::ToolError;

/// Parameters for listing achievements
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AchievementsParams {
    /// Also list achievements that are still locked (default: false)
    pub include_locked: Option<bool>,
}

/// Response listing achievements and points
#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub message: String,
    pub achievements: Vec<AchievementRecord>,
    pub total_points: u32,
}

pub fn list_achievements<S: WellnessStorage>(
    storage: &S,
    user_id: &UserId,
    params: AchievementsParams,
) -> Result<AchievementsResponse, ToolError> {
    let achievements = storage.list_achievements(user_id)?;
    let total_points = achievements.iter().map(|a| a.points).sum();

    let mut message = if achievements.is_empty() {
        "🏆 No achievements unlocked yet. Log your metrics to earn your first one!".to_string()
    } else {
        let lines: Vec<String> = achievements
            .iter()
            .map(|a| {
                format!(
                    "{} **{}** ({}, {} pts)\n   {} | unlocked {}",
                    a.icon,
                    a.title,
                    a.tier.as_str(),
                    a.points,
                    a.description,
                    a.unlocked_at.format("%Y-%m-%d")
                )
            })
            .collect();
        format!(
            "🏆 **Achievements** ({} of {}, {} points)\n\n{}",
            achievements.len(),
            AchievementKind::ALL.len(),
            total_points,
            lines.join("\n")
        )
    };

    if params.include_locked.unwrap_or(false) {
        let locked: Vec<String> = AchievementKind::ALL
            .iter()
            .filter(|kind| !achievements.iter().any(|a| a.kind == **kind))
            .map(|kind| format!("🔒 {}: {}", kind.title(), kind.description()))
            .collect();
        if !locked.is_empty() {
            message.push_str(&format!("\n\n**Still locked**\n{}", locked.join("\n")));
        }
    }

    Ok(AchievementsResponse {
        message,
        achievements,
        total_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use chrono::Utc;

    #[test]
    fn test_empty_list() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let response = list_achievements(&storage, &UserId::new("u"), AchievementsParams::default()).unwrap();

        assert!(response.achievements.is_empty());
        assert_eq!(response.total_points, 0);
        assert!(response.message.contains("No achievements"));
    }

    #[test]
    fn test_points_are_summed() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = UserId::new("u");
        let unlocked = vec![
            AchievementRecord::unlock(AchievementKind::StepMaster, Utc::now()),
            AchievementRecord::unlock(AchievementKind::SleepChampion, Utc::now()),
        ];
        storage.unlock_achievements(&user, &unlocked).unwrap();

        let params = AchievementsParams {
            include_locked: Some(true),
        };
        let response = list_achievements(&storage, &user, params).unwrap();

        let expected = AchievementKind::StepMaster.points() + AchievementKind::SleepChampion.points();
        assert_eq!(response.total_points, expected);
        assert!(response.message.contains("Still locked"));
        assert!(response.message.contains(AchievementKind::ZenMaster.title()));
    }
}

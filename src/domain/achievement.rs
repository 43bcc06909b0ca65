//! Achievements unlocked by crossing metric thresholds

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{AchievementId, DomainError};

/// Reward tier of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

/// Stable key of an achievement rule
///
/// This is what deduplication is based on: an achievement kind is unlocked at
/// most once per user, however many times its threshold is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    StepMaster,
    WorkoutWarrior,
    SleepChampion,
    HydrationHero,
    MoodBooster,
    ZenMaster,
    StressManager,
    ReflectiveWriter,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 8] = [
        AchievementKind::StepMaster,
        AchievementKind::WorkoutWarrior,
        AchievementKind::SleepChampion,
        AchievementKind::HydrationHero,
        AchievementKind::MoodBooster,
        AchievementKind::ZenMaster,
        AchievementKind::StressManager,
        AchievementKind::ReflectiveWriter,
    ];

    /// Key used in storage
    pub fn key(&self) -> &'static str {
        match self {
            AchievementKind::StepMaster => "step_master",
            AchievementKind::WorkoutWarrior => "workout_warrior",
            AchievementKind::SleepChampion => "sleep_champion",
            AchievementKind::HydrationHero => "hydration_hero",
            AchievementKind::MoodBooster => "mood_booster",
            AchievementKind::ZenMaster => "zen_master",
            AchievementKind::StressManager => "stress_manager",
            AchievementKind::ReflectiveWriter => "reflective_writer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AchievementKind::StepMaster => "Step Master",
            AchievementKind::WorkoutWarrior => "Workout Warrior",
            AchievementKind::SleepChampion => "Sleep Champion",
            AchievementKind::HydrationHero => "Hydration Hero",
            AchievementKind::MoodBooster => "Mood Booster",
            AchievementKind::ZenMaster => "Zen Master",
            AchievementKind::StressManager => "Stress Manager",
            AchievementKind::ReflectiveWriter => "Reflective Writer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementKind::StepMaster => "Reached 10,000 steps in a day",
            AchievementKind::WorkoutWarrior => "Completed a 30-minute workout",
            AchievementKind::SleepChampion => "Got 8+ hours of quality sleep",
            AchievementKind::HydrationHero => "Drank 8 glasses of water",
            AchievementKind::MoodBooster => "Improved your mood from yesterday",
            AchievementKind::ZenMaster => "Completed 10+ minutes of mindfulness",
            AchievementKind::StressManager => "Maintained low stress levels",
            AchievementKind::ReflectiveWriter => "Wrote a detailed journal entry",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AchievementKind::StepMaster => "👣",
            AchievementKind::WorkoutWarrior => "💪",
            AchievementKind::SleepChampion => "😴",
            AchievementKind::HydrationHero => "💧",
            AchievementKind::MoodBooster => "😊",
            AchievementKind::ZenMaster => "🧘",
            AchievementKind::StressManager => "🌟",
            AchievementKind::ReflectiveWriter => "📝",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            AchievementKind::WorkoutWarrior
            | AchievementKind::HydrationHero
            | AchievementKind::MoodBooster => Tier::Bronze,
            AchievementKind::StepMaster
            | AchievementKind::SleepChampion
            | AchievementKind::ZenMaster => Tier::Silver,
            AchievementKind::StressManager | AchievementKind::ReflectiveWriter => Tier::Gold,
        }
    }

    pub fn points(&self) -> u32 {
        match self.tier() {
            Tier::Bronze => 10,
            Tier::Silver => 20,
            Tier::Gold => 30,
            Tier::Platinum => 50,
        }
    }
}

impl fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AchievementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AchievementKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| DomainError::InvalidValue {
                message: format!("Unknown achievement '{}'", s),
            })
    }
}

/// A single unlock event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    /// Random per evaluation, not stable across calls
    pub id: AchievementId,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
    pub tier: Tier,
    pub points: u32,
}

impl AchievementRecord {
    /// Build a freshly unlocked record for a rule
    pub fn unlock(kind: AchievementKind, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id: AchievementId::new(),
            kind,
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            unlocked_at,
            tier: kind.tier(),
            points: kind.points(),
        }
    }

    /// Rebuild a record loaded from storage
    pub fn from_existing(id: AchievementId, kind: AchievementKind, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id,
            ..Self::unlock(kind, unlocked_at)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_key() {
        for kind in AchievementKind::ALL {
            assert_eq!(kind.key().parse::<AchievementKind>().unwrap(), kind);
        }
        assert!("couch_potato".parse::<AchievementKind>().is_err());
    }

    #[test]
    fn test_unlock_generates_new_ids() {
        let now = Utc::now();
        let a = AchievementRecord::unlock(AchievementKind::StepMaster, now);
        let b = AchievementRecord::unlock(AchievementKind::StepMaster, now);

        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.title, "Step Master");
        assert_eq!(a.tier, Tier::Silver);
        assert_eq!(a.points, 20);
    }
}

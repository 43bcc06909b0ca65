//! Daily health goals and progress toward them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{DomainError, HealthMetricRecord, UserProfile};

/// What a goal measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Sleep,
    Steps,
    Calories,
    Water,
    Exercise,
    Weight,
    Mindful,
}

impl GoalKind {
    pub const ALL: [GoalKind; 7] = [
        GoalKind::Sleep,
        GoalKind::Steps,
        GoalKind::Calories,
        GoalKind::Water,
        GoalKind::Exercise,
        GoalKind::Weight,
        GoalKind::Mindful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Sleep => "sleep",
            GoalKind::Steps => "steps",
            GoalKind::Calories => "calories",
            GoalKind::Water => "water",
            GoalKind::Exercise => "exercise",
            GoalKind::Weight => "weight",
            GoalKind::Mindful => "mindful",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            GoalKind::Sleep => "hours",
            GoalKind::Steps => "steps",
            GoalKind::Calories => "kcal",
            GoalKind::Water => "glasses",
            GoalKind::Exercise | GoalKind::Mindful => "minutes",
            GoalKind::Weight => "kg",
        }
    }

    /// Today's value for this goal
    ///
    /// Weight comes from the profile; everything else from the day's record.
    /// Missing data counts as zero.
    pub fn current(&self, record: Option<&HealthMetricRecord>, profile: Option<&UserProfile>) -> f64 {
        let from_record = |f: fn(&HealthMetricRecord) -> f64| record.map(f).unwrap_or(0.0);
        match self {
            GoalKind::Sleep => from_record(|r| r.sleep_hours),
            GoalKind::Steps => from_record(|r| f64::from(r.steps)),
            GoalKind::Calories => from_record(|r| f64::from(r.calories)),
            GoalKind::Water => from_record(|r| f64::from(r.water_glasses)),
            GoalKind::Exercise => from_record(|r| f64::from(r.exercise_minutes)),
            GoalKind::Mindful => from_record(|r| r.mindful_minutes.map(f64::from).unwrap_or(0.0)),
            GoalKind::Weight => profile.map(|p| p.weight_kg).unwrap_or(0.0),
        }
    }
}

impl fmt::Display for GoalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sleep" => Ok(GoalKind::Sleep),
            "steps" => Ok(GoalKind::Steps),
            "calories" => Ok(GoalKind::Calories),
            "water" => Ok(GoalKind::Water),
            "exercise" => Ok(GoalKind::Exercise),
            "weight" => Ok(GoalKind::Weight),
            "mindful" => Ok(GoalKind::Mindful),
            other => Err(DomainError::InvalidValue {
                message: format!("Unknown goal type '{}'", other),
            }),
        }
    }
}

/// A target for one goal kind; a user has at most one per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthGoal {
    pub kind: GoalKind,
    pub target: f64,
}

impl HealthGoal {
    pub fn new(kind: GoalKind, target: f64) -> Result<Self, DomainError> {
        if !target.is_finite() || target <= 0.0 {
            return Err(DomainError::InvalidValue {
                message: format!("Goal target for {} must be positive, got {}", kind, target),
            });
        }
        Ok(Self { kind, target })
    }

    pub fn progress(&self, current: f64) -> GoalProgress {
        let percent = current / self.target * 100.0;
        GoalProgress {
            kind: self.kind,
            target: self.target,
            current,
            percent,
            status: GoalStatus::from_percent(percent),
        }
    }
}

/// Goals every user starts with
pub fn default_goals() -> Vec<HealthGoal> {
    [
        (GoalKind::Sleep, 8.0),
        (GoalKind::Steps, 10_000.0),
        (GoalKind::Water, 8.0),
        (GoalKind::Exercise, 30.0),
        (GoalKind::Calories, 2000.0),
    ]
    .into_iter()
    .map(|(kind, target)| HealthGoal { kind, target })
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// 100 % or more
    Reached,
    /// 75 % or more
    Close,
    /// 50 % or more
    Halfway,
    Behind,
}

impl GoalStatus {
    fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            GoalStatus::Reached
        } else if percent >= 75.0 {
            GoalStatus::Close
        } else if percent >= 50.0 {
            GoalStatus::Halfway
        } else {
            GoalStatus::Behind
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            GoalStatus::Reached => "🟢",
            GoalStatus::Close => "🔵",
            GoalStatus::Halfway => "🟡",
            GoalStatus::Behind => "🔴",
        }
    }
}

/// A goal measured against today's value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub kind: GoalKind,
    pub target: f64,
    pub current: f64,
    /// Uncapped; above 100 when the target was exceeded
    pub percent: f64,
    pub status: GoalStatus,
}

impl GoalProgress {
    /// Ten-cell bar, capped at full
    pub fn bar(&self) -> String {
        let filled = (self.percent.clamp(0.0, 100.0) / 10.0).round() as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
    }
}

//! Core types and enums used throughout the domain layer
//!
//! This module defines identifiers, the tracked metric keys and the small
//! classification enums (trend, tier, activity level) shared by records,
//! analytics and storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::DomainError;

/// Identifier of the user owning metrics, achievements and tokens
///
/// The MCP server runs for a single local user by default, but every storage
/// operation is keyed by user so the same database can hold several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an achievement unlock event
///
/// A fresh one is generated on every evaluation, so it must never be used
/// to decide whether an achievement was already unlocked. Use
/// [`AchievementKind`](crate::domain::AchievementKind) for that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AchievementId(pub Uuid);

impl AchievementId {
    /// Generate a new random achievement ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an achievement ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AchievementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a chat message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a larger value of a metric is good or bad for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// How the "stable" dead-band of a trend is measured for a metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeadBand {
    /// Stable while |recent - prior| < value
    Absolute(f64),
    /// Stable while |recent - prior| < fraction * |prior|
    Relative(f64),
}

/// The tracked daily metrics
///
/// Each key knows its display name, its polarity and the dead-band used when
/// classifying its trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Sleep,
    Steps,
    Calories,
    Water,
    Exercise,
    Mood,
    Stress,
    Mindful,
}

impl MetricKey {
    /// Every tracked key, in display order
    pub const ALL: [MetricKey; 8] = [
        MetricKey::Sleep,
        MetricKey::Steps,
        MetricKey::Calories,
        MetricKey::Water,
        MetricKey::Exercise,
        MetricKey::Mood,
        MetricKey::Stress,
        MetricKey::Mindful,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKey::Sleep => "Sleep",
            MetricKey::Steps => "Steps",
            MetricKey::Calories => "Calories",
            MetricKey::Water => "Water",
            MetricKey::Exercise => "Exercise",
            MetricKey::Mood => "Mood",
            MetricKey::Stress => "Stress",
            MetricKey::Mindful => "Mindful minutes",
        }
    }

    /// Unit suffix used when rendering values
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKey::Sleep => "h",
            MetricKey::Steps => "steps",
            MetricKey::Calories => "kcal",
            MetricKey::Water => "glasses",
            MetricKey::Exercise | MetricKey::Mindful => "min",
            MetricKey::Mood | MetricKey::Stress => "/5",
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            MetricKey::Stress => Polarity::LowerIsBetter,
            _ => Polarity::HigherIsBetter,
        }
    }

    /// Small 1-5 scales and hours use an absolute band, counts use 5 %
    pub fn dead_band(&self) -> DeadBand {
        match self {
            MetricKey::Sleep | MetricKey::Mood | MetricKey::Stress => DeadBand::Absolute(0.1),
            MetricKey::Steps
            | MetricKey::Calories
            | MetricKey::Water
            | MetricKey::Exercise
            | MetricKey::Mindful => DeadBand::Relative(0.05),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Short-term direction of a metric, already adjusted for polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

/// Raw day-over-day movement of a value, without polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Self-reported activity level from the user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl FromStr for ActivityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" | "very active" => Ok(ActivityLevel::VeryActive),
            other => Err(DomainError::InvalidValue {
                message: format!("Unknown activity level '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(DomainError::InvalidValue {
                message: format!("Unknown gender '{}'", other),
            }),
        }
    }
}

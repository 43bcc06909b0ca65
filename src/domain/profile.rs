//! User profile used to personalize insight thresholds

use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, DomainError, Gender};

/// Basic body and lifestyle information about the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
    pub activity_level: Option<ActivityLevel>,
}

impl UserProfile {
    pub fn new(
        name: String,
        age: u32,
        weight_kg: f64,
        height_cm: f64,
        gender: Gender,
        activity_level: Option<ActivityLevel>,
    ) -> Result<Self, DomainError> {
        let profile = Self {
            name,
            age,
            weight_kg,
            height_cm,
            gender,
            activity_level,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Profile name cannot be empty".to_string(),
            });
        }
        if self.age == 0 || self.age > 130 {
            return Err(DomainError::InvalidValue {
                message: format!("Age must be between 1 and 130, got {}", self.age),
            });
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(DomainError::InvalidValue {
                message: "Weight must be a positive number".to_string(),
            });
        }
        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            return Err(DomainError::InvalidValue {
                message: "Height must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Nightly sleep goal in hours
    pub fn sleep_target(&self) -> f64 {
        if self.age > 65 {
            7.0
        } else {
            8.0
        }
    }

    /// Daily step goal
    pub fn steps_target(&self) -> u32 {
        match self.activity_level {
            Some(ActivityLevel::Active) => 12_000,
            Some(_) => 10_000,
            None => DEFAULT_STEPS_TARGET,
        }
    }
}

/// Sleep goal when no profile is known
pub const DEFAULT_SLEEP_TARGET: f64 = 8.0;
/// Step goal when no profile or activity level is known
pub const DEFAULT_STEPS_TARGET: u32 = 8_000;

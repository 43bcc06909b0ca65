/// Tool for creating or updating the user profile
///
/// This module implements the profile_update MCP tool. The profile drives the
/// personalized sleep and step targets used by the insight rules.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, Gender, UserId, UserProfile};
use crate::storage::WellnessStorage;
use crate::tools::ToolError;

/// Parameters for updating the profile
///
/// Every field is optional once a profile exists; creating one needs all
/// fields except the activity level.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ProfileParams {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    /// male, female or other
    pub gender: Option<String>,
    /// sedentary, light, moderate, active or very_active
    pub activity_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub message: String,
    pub profile: UserProfile,
}

pub fn update_profile<S: WellnessStorage>(
    storage: &S,
    user_id: &UserId,
    params: ProfileParams,
) -> Result<ProfileResponse, ToolError> {
    let gender = params.gender.as_deref().map(str::parse::<Gender>).transpose()?;
    let activity_level = params
        .activity_level
        .as_deref()
        .map(str::parse::<ActivityLevel>)
        .transpose()?;

    let (profile, created) = match storage.get_profile(user_id)? {
        Some(mut profile) => {
            if let Some(name) = params.name {
                profile.name = name;
            }
            if let Some(age) = params.age {
                profile.age = age;
            }
            if let Some(weight) = params.weight_kg {
                profile.weight_kg = weight;
            }
            if let Some(height) = params.height_cm {
                profile.height_cm = height;
            }
            if let Some(gender) = gender {
                profile.gender = gender;
            }
            if activity_level.is_some() {
                profile.activity_level = activity_level;
            }
            profile.validate()?;
            (profile, false)
        }
        None => match (params.name, params.age, params.weight_kg, params.height_cm, gender) {
            (Some(name), Some(age), Some(weight), Some(height), Some(gender)) => {
                (UserProfile::new(name, age, weight, height, gender, activity_level)?, true)
            }
            _ => {
                return Err(ToolError::InvalidInput(
                    "A new profile needs name, age, weight_kg, height_cm and gender".to_string(),
                ))
            }
        },
    };

    storage.save_profile(user_id, &profile)?;
    tracing::info!("Saved profile for {}", user_id);

    let message = format!(
        "👤 Profile {} for {}\nSleep target: {} h | Step target: {}",
        if created { "created" } else { "updated" },
        profile.name,
        profile.sleep_target(),
        profile.steps_target()
    );

    Ok(ProfileResponse {
        success: true,
        message,
        profile,
    })
}

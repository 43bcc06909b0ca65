//! Daily health metric records
//!
//! A `HealthMetricRecord` holds one calendar day of tracked values for a user.
//! Records are unique by date; writes for the same day replace the record.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, MetricKey};

const MAX_SLEEP_HOURS: f64 = 24.0;
const MAX_STEPS: u32 = 200_000;
const MAX_JOURNAL_CHARS: usize = 5_000;

/// One day's worth of tracked health values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricRecord {
    /// Calendar day this record describes
    pub date: NaiveDate,
    pub sleep_hours: f64,
    pub steps: u32,
    pub calories: u32,
    pub water_glasses: u32,
    pub exercise_minutes: u32,
    /// Mood rating 1-5
    pub mood: u8,
    /// Stress rating 1-5 (1 = very low)
    pub stress_level: Option<u8>,
    pub mindful_minutes: Option<u32>,
    /// Free-form daily reflection
    pub journal_entry: Option<String>,
}

impl HealthMetricRecord {
    /// Create a validated record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        sleep_hours: f64,
        steps: u32,
        calories: u32,
        water_glasses: u32,
        exercise_minutes: u32,
        mood: u8,
        stress_level: Option<u8>,
        mindful_minutes: Option<u32>,
        journal_entry: Option<String>,
    ) -> Result<Self, DomainError> {
        let record = Self {
            date,
            sleep_hours,
            steps,
            calories,
            water_glasses,
            exercise_minutes,
            mood,
            stress_level,
            mindful_minutes,
            journal_entry,
        };
        record.validate()?;
        Ok(record)
    }

    /// Generate a plausible record for a day with no real data yet
    pub fn seeded<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        Self {
            date,
            sleep_hours: 7.0 + rng.gen::<f64>() * 2.0,
            steps: rng.gen_range(6000..12000),
            calories: rng.gen_range(1800..2600),
            water_glasses: rng.gen_range(4..9),
            exercise_minutes: rng.gen_range(15..60),
            mood: rng.gen_range(1..=5),
            stress_level: Some(rng.gen_range(1..=5)),
            mindful_minutes: Some(rng.gen_range(0..20)),
            journal_entry: None,
        }
    }

    /// Value of a tracked metric, `None` when an optional field is absent
    pub fn value(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::Sleep => Some(self.sleep_hours),
            MetricKey::Steps => Some(f64::from(self.steps)),
            MetricKey::Calories => Some(f64::from(self.calories)),
            MetricKey::Water => Some(f64::from(self.water_glasses)),
            MetricKey::Exercise => Some(f64::from(self.exercise_minutes)),
            MetricKey::Mood => Some(f64::from(self.mood)),
            MetricKey::Stress => self.stress_level.map(f64::from),
            MetricKey::Mindful => self.mindful_minutes.map(f64::from),
        }
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.sleep_hours.is_finite() || self.sleep_hours < 0.0 || self.sleep_hours > MAX_SLEEP_HOURS {
            return Err(DomainError::InvalidValue {
                message: format!("Sleep hours must be between 0 and 24, got {}", self.sleep_hours),
            });
        }
        if self.steps > MAX_STEPS {
            return Err(DomainError::InvalidValue {
                message: format!("Steps cannot exceed {}", MAX_STEPS),
            });
        }
        Self::validate_rating("Mood", self.mood)?;
        if let Some(stress) = self.stress_level {
            Self::validate_rating("Stress level", stress)?;
        }
        if let Some(journal) = &self.journal_entry {
            if journal.chars().count() > MAX_JOURNAL_CHARS {
                return Err(DomainError::InvalidValue {
                    message: format!("Journal entry cannot be longer than {} characters", MAX_JOURNAL_CHARS),
                });
            }
        }
        Ok(())
    }

    fn validate_rating(name: &str, value: u8) -> Result<(), DomainError> {
        if !(1..=5).contains(&value) {
            return Err(DomainError::InvalidValue {
                message: format!("{} must be between 1 and 5, got {}", name, value),
            });
        }
        Ok(())
    }
}

/// Generate a week of seed records ending at `today`, most recent first
pub fn generate_initial_metrics<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<HealthMetricRecord> {
    (0..7)
        .map(|offset| HealthMetricRecord::seeded(today - Duration::days(offset), rng))
        .collect()
}

/// Partial update of a day's record
///
/// Every field is optional; only the provided ones are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricUpdate {
    pub sleep_hours: Option<f64>,
    pub steps: Option<u32>,
    pub calories: Option<u32>,
    pub water_glasses: Option<u32>,
    pub exercise_minutes: Option<u32>,
    pub mood: Option<u8>,
    pub stress_level: Option<u8>,
    pub mindful_minutes: Option<u32>,
    pub journal_entry: Option<String>,
}

impl MetricUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into an existing record, validating the result
    ///
    /// The record is left untouched when validation fails.
    pub fn apply_to(&self, record: &mut HealthMetricRecord) -> Result<(), DomainError> {
        let mut updated = record.clone();

        if let Some(v) = self.sleep_hours {
            updated.sleep_hours = v;
        }
        if let Some(v) = self.steps {
            updated.steps = v;
        }
        if let Some(v) = self.calories {
            updated.calories = v;
        }
        if let Some(v) = self.water_glasses {
            updated.water_glasses = v;
        }
        if let Some(v) = self.exercise_minutes {
            updated.exercise_minutes = v;
        }
        if let Some(v) = self.mood {
            updated.mood = v;
        }
        if let Some(v) = self.stress_level {
            updated.stress_level = Some(v);
        }
        if let Some(v) = self.mindful_minutes {
            updated.mindful_minutes = Some(v);
        }
        if let Some(v) = &self.journal_entry {
            updated.journal_entry = Some(v.clone());
        }

        updated.validate()?;
        *record = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_create_valid_record() {
        let record = HealthMetricRecord::new(day(1), 7.5, 9000, 2100, 6, 40, 4, Some(2), Some(10), None);
        assert!(record.is_ok());
        let record = record.unwrap();
        assert_eq!(record.value(MetricKey::Steps), Some(9000.0));
        assert_eq!(record.value(MetricKey::Stress), Some(2.0));
    }

    #[test]
    fn test_invalid_mood_rejected() {
        let result = HealthMetricRecord::new(day(1), 7.5, 9000, 2100, 6, 40, 6, None, None, None);
        assert!(result.is_err());

        let result = HealthMetricRecord::new(day(1), 7.5, 9000, 2100, 6, 40, 0, None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_sleep_rejected() {
        let result = HealthMetricRecord::new(day(1), 25.0, 9000, 2100, 6, 40, 3, None, None, None);
        assert!(result.is_err());
        let result = HealthMetricRecord::new(day(1), f64::NAN, 9000, 2100, 6, 40, 3, None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_seeded_records_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        let week = generate_initial_metrics(day(10), &mut rng);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(10));
        assert_eq!(week[6].date, day(4));
        for record in &week {
            assert!(record.validate().is_ok());
            assert!((7.0..9.0).contains(&record.sleep_hours));
            assert!((6000..12000).contains(&record.steps));
        }
    }

    #[test]
    fn test_update_merges_only_provided_fields() {
        let mut record = HealthMetricRecord::new(day(1), 7.0, 5000, 2000, 4, 20, 3, None, None, None).unwrap();
        let update = MetricUpdate {
            steps: Some(10500),
            journal_entry: Some("walked to work".to_string()),
            ..Default::default()
        };

        update.apply_to(&mut record).unwrap();
        assert_eq!(record.steps, 10500);
        assert_eq!(record.sleep_hours, 7.0);
        assert_eq!(record.journal_entry.as_deref(), Some("walked to work"));
    }

    #[test]
    fn test_invalid_update_leaves_record_untouched() {
        let mut record = HealthMetricRecord::new(day(1), 7.0, 5000, 2000, 4, 20, 3, None, None, None).unwrap();
        let before = record.clone();
        let update = MetricUpdate {
            steps: Some(8000),
            mood: Some(9),
            ..Default::default()
        };

        assert!(update.apply_to(&mut record).is_err());
        assert_eq!(record, before);
    }
}

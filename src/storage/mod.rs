/// Storage layer for persisting wellness data
///
/// This module handles all database operations using SQLite: daily metric
/// records, the user profile, goals, unlocked achievements, the assistant
/// chat history and provider tokens.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{AchievementRecord, ChatMessage, HealthGoal, HealthMetricRecord, UserId, UserProfile};
use crate::providers::{ProviderKind, ProviderToken};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metric record not found for {user_id} on {date}")]
    MetricNotFound { user_id: String, date: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the storage interface
///
/// Every method is scoped to one user. Writes replace whole records; the
/// last write wins.
pub trait WellnessStorage {
    /// Insert or replace the record for `metric.date`
    fn upsert_metric(&self, user_id: &UserId, metric: &HealthMetricRecord) -> Result<(), StorageError>;

    /// Most-recent-first history, optionally limited to `limit` records
    fn get_metrics(&self, user_id: &UserId, limit: Option<u32>) -> Result<Vec<HealthMetricRecord>, StorageError>;

    /// The record for one day
    fn get_metric(&self, user_id: &UserId, date: NaiveDate) -> Result<HealthMetricRecord, StorageError>;

    fn save_profile(&self, user_id: &UserId, profile: &UserProfile) -> Result<(), StorageError>;

    /// `None` when no profile exists or the stored one cannot be read
    fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StorageError>;

    /// Insert or replace goals, one per kind
    fn save_goals(&self, user_id: &UserId, goals: &[HealthGoal]) -> Result<(), StorageError>;

    /// Stored goals; empty when the user never saved any
    fn get_goals(&self, user_id: &UserId) -> Result<Vec<HealthGoal>, StorageError>;

    /// Persist achievements, ignoring kinds the user already has
    ///
    /// Returns only the records that were actually inserted.
    fn unlock_achievements(
        &self,
        user_id: &UserId,
        achievements: &[AchievementRecord],
    ) -> Result<Vec<AchievementRecord>, StorageError>;

    /// All unlocked achievements, oldest first
    fn list_achievements(&self, user_id: &UserId) -> Result<Vec<AchievementRecord>, StorageError>;

    fn append_chat_message(&self, user_id: &UserId, message: &ChatMessage) -> Result<(), StorageError>;

    /// Chat history in chronological order, optionally only the last `limit`
    fn get_chat_history(&self, user_id: &UserId, limit: Option<u32>) -> Result<Vec<ChatMessage>, StorageError>;

    /// Returns the number of deleted messages
    fn clear_chat_history(&self, user_id: &UserId) -> Result<usize, StorageError>;

    fn save_provider_token(&self, user_id: &UserId, token: &ProviderToken) -> Result<(), StorageError>;

    fn get_provider_token(
        &self,
        user_id: &UserId,
        provider: ProviderKind,
    ) -> Result<Option<ProviderToken>, StorageError>;
}

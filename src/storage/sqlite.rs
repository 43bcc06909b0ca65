/// SQLite implementation of the wellness storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving metrics, profiles, goals, achievements, chat messages and
/// provider tokens. It handles all SQL queries and data conversion.

use std::path::PathBuf;
use rusqlite::{params, Connection, Row};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::domain::{
    AchievementId, AchievementKind, AchievementRecord, ChatMessage, GoalKind, HealthGoal, HealthMetricRecord, MessageId,
    Sender, UserId, UserProfile,
};
use crate::providers::{ProviderKind, ProviderToken};
use crate::storage::{migrations, StorageError, WellnessStorage};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);

        Ok(Self { conn })
    }

    /// Storage backed by a private in-memory database
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    /// Number of users with at least one metric record
    pub fn count_users(&self) -> Result<u32, StorageError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(DISTINCT user_id) FROM health_metrics", [], |row| row.get(0))?;
        Ok(count)
    }

    fn timestamp(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(column, "Invalid datetime".to_string(), rusqlite::types::Type::Text)
            })
    }

    fn metric_from_row(row: &Row<'_>) -> rusqlite::Result<HealthMetricRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "Invalid date".to_string(), rusqlite::types::Type::Text)
        })?;

        Ok(HealthMetricRecord {
            date,
            sleep_hours: row.get(1)?,
            steps: row.get(2)?,
            calories: row.get(3)?,
            water_glasses: row.get(4)?,
            exercise_minutes: row.get(5)?,
            mood: row.get(6)?,
            stress_level: row.get(7)?,
            mindful_minutes: row.get(8)?,
            journal_entry: row.get(9)?,
        })
    }
}

const METRIC_COLUMNS: &str = "date, sleep_hours, steps, calories, water_glasses, exercise_minutes, mood,
     stress_level, mindful_minutes, journal_entry";

impl WellnessStorage for SqliteStorage {
    fn upsert_metric(&self, user_id: &UserId, metric: &HealthMetricRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO health_metrics (
                user_id, date, sleep_hours, steps, calories, water_glasses, exercise_minutes, mood,
                stress_level, mindful_minutes, journal_entry, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (user_id, date) DO UPDATE SET
                sleep_hours = excluded.sleep_hours,
                steps = excluded.steps,
                calories = excluded.calories,
                water_glasses = excluded.water_glasses,
                exercise_minutes = excluded.exercise_minutes,
                mood = excluded.mood,
                stress_level = excluded.stress_level,
                mindful_minutes = excluded.mindful_minutes,
                journal_entry = excluded.journal_entry,
                updated_at = excluded.updated_at",
            params![
                user_id.as_str(),
                metric.date.format(DATE_FORMAT).to_string(),
                metric.sleep_hours,
                metric.steps,
                metric.calories,
                metric.water_glasses,
                metric.exercise_minutes,
                metric.mood,
                metric.stress_level,
                metric.mindful_minutes,
                metric.journal_entry,
                Self::timestamp(&Utc::now()),
            ],
        )?;

        tracing::debug!("Saved metrics for {} on {}", user_id, metric.date);
        Ok(())
    }

    fn get_metrics(&self, user_id: &UserId, limit: Option<u32>) -> Result<Vec<HealthMetricRecord>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM health_metrics WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            METRIC_COLUMNS
        ))?;

        // A negative LIMIT means no limit in SQLite
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = stmt.query_map(params![user_id.as_str(), limit], Self::metric_from_row)?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }
        Ok(metrics)
    }

    fn get_metric(&self, user_id: &UserId, date: NaiveDate) -> Result<HealthMetricRecord, StorageError> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM health_metrics WHERE user_id = ?1 AND date = ?2",
            METRIC_COLUMNS
        ))?;

        match stmt.query_row(params![user_id.as_str(), date_str], Self::metric_from_row) {
            Ok(metric) => Ok(metric),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::MetricNotFound {
                user_id: user_id.to_string(),
                date: date_str,
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn save_profile(&self, user_id: &UserId, profile: &UserProfile) -> Result<(), StorageError> {
        let data = serde_json::to_string(profile)?;
        self.conn.execute(
            "INSERT INTO user_profiles (user_id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![user_id.as_str(), data, Self::timestamp(&Utc::now())],
        )?;

        tracing::debug!("Saved profile for {}", user_id);
        Ok(())
    }

    fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        let data: String = match self.conn.query_row(
            "SELECT data FROM user_profiles WHERE user_id = ?1",
            params![user_id.as_str()],
            |row| row.get(0),
        ) {
            Ok(data) => data,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(StorageError::Query(e)),
        };

        match serde_json::from_str(&data) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable profile for {}: {}", user_id, e);
                Ok(None)
            }
        }
    }

    fn save_goals(&self, user_id: &UserId, goals: &[HealthGoal]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO health_goals (user_id, kind, target, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, kind) DO UPDATE SET target = excluded.target, updated_at = excluded.updated_at",
            )?;
            let now = Self::timestamp(&Utc::now());
            for goal in goals {
                stmt.execute(params![user_id.as_str(), goal.kind.as_str(), goal.target, now])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} goal(s) for {}", goals.len(), user_id);
        Ok(())
    }

    fn get_goals(&self, user_id: &UserId) -> Result<Vec<HealthGoal>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, target FROM health_goals WHERE user_id = ?1 ORDER BY rowid")?;

        let rows = stmt.query_map(params![user_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut goals = Vec::new();
        for row in rows {
            let (kind_str, target) = row?;
            match kind_str.parse::<GoalKind>() {
                Ok(kind) => goals.push(HealthGoal { kind, target }),
                Err(e) => tracing::warn!("Skipping stored goal for {}: {}", user_id, e),
            }
        }
        Ok(goals)
    }

    fn unlock_achievements(
        &self,
        user_id: &UserId,
        achievements: &[AchievementRecord],
    ) -> Result<Vec<AchievementRecord>, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = Vec::new();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO achievements (id, user_id, kind, unlocked_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for achievement in achievements {
                let changed = stmt.execute(params![
                    achievement.id.to_string(),
                    user_id.as_str(),
                    achievement.kind.key(),
                    Self::timestamp(&achievement.unlocked_at),
                ])?;
                if changed > 0 {
                    inserted.push(achievement.clone());
                }
            }
        }
        tx.commit()?;

        if !inserted.is_empty() {
            tracing::info!("Unlocked {} achievement(s) for {}", inserted.len(), user_id);
        }
        Ok(inserted)
    }

    fn list_achievements(&self, user_id: &UserId) -> Result<Vec<AchievementRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, unlocked_at FROM achievements WHERE user_id = ?1 ORDER BY unlocked_at, kind",
        )?;

        let rows = stmt.query_map(params![user_id.as_str()], |row| {
            let id_str: String = row.get(0)?;
            let id = AchievementId::from_string(&id_str).map_err(|_| {
                rusqlite::Error::InvalidColumnType(0, "Invalid UUID".to_string(), rusqlite::types::Type::Text)
            })?;

            let kind_str: String = row.get(1)?;
            let kind = kind_str.parse::<AchievementKind>().map_err(|_| {
                rusqlite::Error::InvalidColumnType(1, "Invalid achievement kind".to_string(), rusqlite::types::Type::Text)
            })?;

            let unlocked_at_str: String = row.get(2)?;
            let unlocked_at = Self::parse_timestamp(&unlocked_at_str, 2)?;

            Ok(AchievementRecord::from_existing(id, kind, unlocked_at))
        })?;

        let mut achievements = Vec::new();
        for row in rows {
            achievements.push(row?);
        }
        Ok(achievements)
    }

    fn append_chat_message(&self, user_id: &UserId, message: &ChatMessage) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO chat_messages (id, user_id, sender, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id.to_string(),
                user_id.as_str(),
                message.sender.as_str(),
                message.content,
                Self::timestamp(&message.timestamp),
            ],
        )?;

        tracing::debug!("Appended {} message for {}", message.sender.as_str(), user_id);
        Ok(())
    }

    fn get_chat_history(&self, user_id: &UserId, limit: Option<u32>) -> Result<Vec<ChatMessage>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender, content, created_at FROM chat_messages
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;

        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = stmt.query_map(params![user_id.as_str(), limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (id_str, sender_str, content, created_at_str) = row?;

            let sender = match sender_str.parse::<Sender>() {
                Ok(sender) => sender,
                Err(e) => {
                    tracing::warn!("Skipping chat message {}: {}", id_str, e);
                    continue;
                }
            };
            let id = MessageId::from_string(&id_str).map_err(|_| {
                rusqlite::Error::InvalidColumnType(0, "Invalid UUID".to_string(), rusqlite::types::Type::Text)
            })?;
            let timestamp = Self::parse_timestamp(&created_at_str, 3)?;

            messages.push(ChatMessage {
                id,
                sender,
                content,
                timestamp,
            });
        }

        messages.reverse();
        Ok(messages)
    }

    fn clear_chat_history(&self, user_id: &UserId) -> Result<usize, StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM chat_messages WHERE user_id = ?1", params![user_id.as_str()])?;

        tracing::info!("Cleared {} chat message(s) for {}", deleted, user_id);
        Ok(deleted)
    }

    fn save_provider_token(&self, user_id: &UserId, token: &ProviderToken) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO provider_tokens (user_id, provider, access_token, refresh_token, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id.as_str(),
                token.provider.as_str(),
                token.access_token,
                token.refresh_token,
                token.expires_at.as_ref().map(Self::timestamp),
            ],
        )?;

        tracing::debug!("Saved {} token for {}", token.provider.as_str(), user_id);
        Ok(())
    }

    fn get_provider_token(
        &self,
        user_id: &UserId,
        provider: ProviderKind,
    ) -> Result<Option<ProviderToken>, StorageError> {
        let result = self.conn.query_row(
            "SELECT access_token, refresh_token, expires_at FROM provider_tokens
             WHERE user_id = ?1 AND provider = ?2",
            params![user_id.as_str(), provider.as_str()],
            |row| {
                let expires_at = match row.get::<_, Option<String>>(2)? {
                    Some(value) => Some(Self::parse_timestamp(&value, 2)?),
                    None => None,
                };
                Ok(ProviderToken {
                    provider,
                    access_token: row.get(0)?,
                    refresh_token: row.get(1)?,
                    expires_at,
                })
            },
        );

        match result {
            Ok(token) => Ok(Some(token)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }
}

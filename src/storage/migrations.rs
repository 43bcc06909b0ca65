/// Database migration management
///
/// Creates and upgrades the SQLite schema: daily metrics, profiles, goals,
/// achievements, chat history and provider tokens.

use rusqlite::Connection;
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 2;

/// Initialize the database schema
///
/// Creates every table and index that does not exist yet and records the
/// schema version.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    match conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(StorageError::Migration(format!("Cannot read schema version: {}", e))),
    }
}

fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    if from_version < 2 {
        migration_v2(conn)?;
    }

    Ok(())
}

/// Migration to version 1: initial tables
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    // One row per user and calendar day
    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_metrics (
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            sleep_hours REAL NOT NULL,
            steps INTEGER NOT NULL,
            calories INTEGER NOT NULL,
            water_glasses INTEGER NOT NULL,
            exercise_minutes INTEGER NOT NULL,
            mood INTEGER NOT NULL,
            stress_level INTEGER,
            mindful_minutes INTEGER,
            journal_entry TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, date)
        )",
        [],
    )?;

    // Profile is stored whole as JSON
    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            user_id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS achievements (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            UNIQUE (user_id, kind)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS chat_messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            sender TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS provider_tokens (
            user_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            expires_at TEXT,
            PRIMARY KEY (user_id, provider)
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

/// Migration to version 2: health goals
fn migration_v2(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS health_goals (
            user_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            target REAL NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, kind)
        )",
        [],
    )?;

    tracing::info!("Applied migration v2: Added health goals");
    Ok(())
}

fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // Metric history is always read newest first
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_health_metrics_user_date
         ON health_metrics (user_id, date DESC)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_chat_messages_user_created
         ON chat_messages (user_id, created_at)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_initialize_database() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(initialize_database(&conn).is_ok());
        // Idempotent
        assert!(initialize_database(&conn).is_ok());

        let table_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN
                 ('health_metrics', 'user_profiles', 'health_goals', 'achievements', 'chat_messages',
                  'provider_tokens')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 6);
    }

    #[test]
    fn test_version_one_database_gains_goals() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE schema_version (version INTEGER PRIMARY KEY)", []).unwrap();
        migration_v1(&conn).unwrap();
        set_version(&conn, 1).unwrap();

        initialize_database(&conn).unwrap();

        let goals_table: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'health_goals'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(goals_table, 1);
        assert_eq!(get_current_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_version_tracking() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_database(&conn).unwrap();
        assert_eq!(get_current_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_achievement_kind_is_unique_per_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_database(&conn).unwrap();

        let insert = "INSERT OR IGNORE INTO achievements (id, user_id, kind, unlocked_at) VALUES (?1, ?2, ?3, ?4)";
        let first = conn.execute(insert, ["a", "u1", "step_master", "2024-01-01T00:00:00Z"]).unwrap();
        let second = conn.execute(insert, ["b", "u1", "step_master", "2024-01-02T00:00:00Z"]).unwrap();
        let other_user = conn.execute(insert, ["c", "u2", "step_master", "2024-01-02T00:00:00Z"]).unwrap();

        assert_eq!((first, second, other_user), (1, 0, 1));
    }
}

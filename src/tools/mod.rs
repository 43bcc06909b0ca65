/// MCP tools for wellness tracking
///
/// This module contains all the MCP tools that external clients (like Claude)
/// can call to log metrics, set goals, read summaries and insights, chat with
/// the assistant and connect fitness providers.

pub mod achievements;
pub mod chat;
pub mod goals;
pub mod insights;
pub mod metrics;
pub mod profile;
pub mod providers;

pub use achievements::*;
pub use chat::*;
pub use goals::*;
pub use insights::*;
pub use metrics::*;
pub use profile::*;
pub use providers::*;

use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

use crate::cache::TtlCache;
use crate::domain::{generate_initial_metrics, DomainError, HealthMetricRecord, UserId};
use crate::providers::ProviderError;
use crate::storage::{StorageError, WellnessStorage};

/// Default number of days read for summaries and insights
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Longest window a summary or insight report can cover
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Errors surfaced by tool handlers
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to `today`
pub(crate) fn parse_date(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ToolError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ToolError::Domain(DomainError::InvalidDate(format!("'{}' is not YYYY-MM-DD", s)))),
        None => Ok(today),
    }
}

/// Resolve a `days` argument, rejecting windows outside 1..=MAX_HISTORY_DAYS
pub(crate) fn history_days(days: Option<u32>) -> Result<u32, ToolError> {
    let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if days == 0 || days > MAX_HISTORY_DAYS {
        return Err(ToolError::InvalidInput(format!(
            "days must be between 1 and {}",
            MAX_HISTORY_DAYS
        )));
    }
    Ok(days)
}

/// Seed a week of data for a user who has none
///
/// Returns true when seeding happened.
pub fn ensure_seeded<S: WellnessStorage, R: Rng + ?Sized>(
    storage: &S,
    user_id: &UserId,
    today: NaiveDate,
    rng: &mut R,
) -> Result<bool, ToolError> {
    if !storage.get_metrics(user_id, Some(1))?.is_empty() {
        return Ok(false);
    }

    for record in generate_initial_metrics(today, rng) {
        storage.upsert_metric(user_id, &record)?;
    }
    tracing::info!("Seeded initial metrics for {}", user_id);
    Ok(true)
}

fn history_key(user_id: &UserId, days: u32) -> String {
    format!("metrics:{}:{}", user_id, days)
}

/// Load up to `days` most-recent-first records through the cache
pub fn load_history<S: WellnessStorage>(
    storage: &S,
    cache: &TtlCache<Vec<HealthMetricRecord>>,
    user_id: &UserId,
    days: u32,
) -> Result<Vec<HealthMetricRecord>, ToolError> {
    let key = history_key(user_id, days);
    if let Some(metrics) = cache.get(&key) {
        tracing::debug!("Metric history for {} served from cache", user_id);
        return Ok(metrics);
    }

    let metrics = storage.get_metrics(user_id, Some(days))?;
    cache.set(key, metrics.clone());
    Ok(metrics)
}

/// Drop every cached history of a user
pub fn invalidate_history(cache: &TtlCache<Vec<HealthMetricRecord>>, user_id: &UserId) {
    cache.invalidate_prefix(&format!("metrics:{}:", user_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        assert_eq!(parse_date(None, today).unwrap(), today);
        assert_eq!(parse_date(Some(" "), today).unwrap(), today);
        assert_eq!(
            parse_date(Some("2024-05-01"), today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert!(parse_date(Some("05/01/2024"), today).is_err());
    }

    #[test]
    fn test_history_days_bounds() {
        assert_eq!(history_days(None).unwrap(), DEFAULT_HISTORY_DAYS);
        assert_eq!(history_days(Some(MAX_HISTORY_DAYS)).unwrap(), MAX_HISTORY_DAYS);
        assert!(matches!(history_days(Some(0)), Err(ToolError::InvalidInput(_))));
        assert!(matches!(history_days(Some(MAX_HISTORY_DAYS + 1)), Err(ToolError::InvalidInput(_))));
    }

    #[test]
    fn test_seeding_happens_once() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let user = UserId::new("new-user");
        let today = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        assert!(ensure_seeded(&storage, &user, today, &mut rng).unwrap());
        assert!(!ensure_seeded(&storage, &user, today, &mut rng).unwrap());

        let metrics = storage.get_metrics(&user, None).unwrap();
        assert_eq!(metrics.len(), 7);
        assert_eq!(metrics[0].date, today);
    }

    #[test]
    fn test_history_cache_is_invalidated() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let cache = TtlCache::default();
        let user = UserId::new("u");
        let today = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        ensure_seeded(&storage, &user, today, &mut StdRng::seed_from_u64(1)).unwrap();

        let first = load_history(&storage, &cache, &user, 7).unwrap();
        let mut changed = first[0].clone();
        changed.steps = 123;
        storage.upsert_metric(&user, &changed).unwrap();

        // Stale until invalidated
        assert_eq!(load_history(&storage, &cache, &user, 7).unwrap(), first);
        invalidate_history(&cache, &user);
        assert_eq!(load_history(&storage, &cache, &user, 7).unwrap()[0].steps, 123);
    }
}

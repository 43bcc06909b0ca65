/// Basic integration tests
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;
use wellness_tracker_mcp::domain::generate_initial_metrics;
use wellness_tracker_mcp::providers::{ProviderKind, ProviderToken};
use wellness_tracker_mcp::*;

fn test_config() -> Config {
    Config::from_lookup(|name| (name == "GEMINI_API_KEY").then(|| "test-key".to_string())).unwrap()
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_server_basic_workflow() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = WellnessTrackerServer::new(temp_file.path().to_path_buf(), test_config(), UserId::new("me"))
            .await
            .expect("Failed to create server");

        assert_eq!(server.user_id().as_str(), "me");
        assert!(server.fitbit().is_none());
        assert_eq!(server.storage().count_users().unwrap(), 0);
        assert!(server.cache().is_empty());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let result = Config::from_lookup(|_| None);
        assert!(matches!(result, Err(ConfigError::MissingVar("GEMINI_API_KEY"))));
    }

    #[test]
    fn test_metric_sequence_round_trips() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let user = UserId::new("u1");
        let today = NaiveDate::from_ymd_opt(2024, 8, 20).unwrap();
        let mut metrics = generate_initial_metrics(today, &mut StdRng::seed_from_u64(42));
        metrics[2].journal_entry = Some("Long walk by the river".to_string());
        metrics[3].stress_level = None;

        {
            let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
            for metric in &metrics {
                storage.upsert_metric(&user, metric).unwrap();
            }
        }

        // Reopen the same file
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        assert_eq!(storage.get_metrics(&user, None).unwrap(), metrics);
        assert_eq!(storage.get_metrics(&user, Some(3)).unwrap(), metrics[..3].to_vec());
        assert!(storage.get_metrics(&UserId::new("someone-else"), None).unwrap().is_empty());
    }

    #[test]
    fn test_achievements_and_tokens_persist() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let user = UserId::new("u1");
        let token = ProviderToken {
            provider: ProviderKind::Fitbit,
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
        };

        {
            let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
            let first = vec![AchievementRecord::unlock(AchievementKind::HydrationHero, Utc::now())];
            assert_eq!(storage.unlock_achievements(&user, &first).unwrap().len(), 1);
            storage.save_provider_token(&user, &token).unwrap();
        }

        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        let again = vec![
            AchievementRecord::unlock(AchievementKind::HydrationHero, Utc::now()),
            AchievementRecord::unlock(AchievementKind::ZenMaster, Utc::now()),
        ];
        let inserted = storage.unlock_achievements(&user, &again).unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].kind, AchievementKind::ZenMaster);
        assert_eq!(storage.list_achievements(&user).unwrap().len(), 2);
        assert_eq!(
            storage.get_provider_token(&user, ProviderKind::Fitbit).unwrap(),
            Some(token)
        );
    }

    #[test]
    fn test_storage_interface() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).expect("Failed to create storage");

        let storage: &dyn WellnessStorage = &storage;
        assert!(storage.get_profile(&UserId::new("nobody")).unwrap().is_none());
    }
}

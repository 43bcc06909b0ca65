/// Public library interface for the Wellness Tracker MCP server
///
/// This module exports the main server implementation and public types
/// that can be used by other applications or tests.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod analytics;
pub mod assistant;
pub mod cache;
pub mod config;
pub mod domain;
pub mod mcp;
pub mod providers;
pub mod storage;
pub mod tools;

// Re-export public modules and types
pub use analytics::AnalyticsEngine;
pub use assistant::{Assistant, AssistantError, GeminiClient, TextGenerator};
pub use cache::TtlCache;
pub use config::{Config, ConfigError};
pub use domain::*;
pub use storage::{SqliteStorage, StorageError, WellnessStorage};

use providers::FitbitClient;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main wellness tracker server that implements the MCP protocol
///
/// The server owns the SQLite storage, the metric history cache, the
/// assistant and the provider clients, all scoped to a single user.
pub struct WellnessTrackerServer {
    storage: SqliteStorage,
    analytics: AnalyticsEngine,
    cache: TtlCache<Vec<HealthMetricRecord>>,
    assistant: Assistant,
    fitbit: Option<FitbitClient>,
    config: Config,
    user_id: UserId,
}

impl WellnessTrackerServer {
    /// Create a new server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub async fn new(db_path: PathBuf, config: Config, user_id: UserId) -> Result<Self, ServerError> {
        tracing::info!("Initializing Wellness Tracker server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;

        let gemini = GeminiClient::new(config.gemini_api_key.clone())
            .with_model(config.gemini_model.clone())
            .with_base_url(config.gemini_base_url.clone());
        tracing::info!("Assistant uses model {}", gemini.model());

        Ok(Self::with_components(storage, Assistant::new(Arc::new(gemini)), config, user_id))
    }

    /// Assemble a server from already built parts (useful for testing)
    pub fn with_components(storage: SqliteStorage, assistant: Assistant, config: Config, user_id: UserId) -> Self {
        let fitbit = config
            .fitbit
            .as_ref()
            .map(|c| FitbitClient::new(c.client_id.clone(), c.client_secret.clone()));

        Self {
            storage,
            analytics: AnalyticsEngine::new(),
            cache: TtlCache::default(),
            assistant,
            fitbit,
            config,
            user_id,
        }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until the server is shut down or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        // Test database connectivity
        let users = self.storage.count_users()?;
        tracing::info!(
            "Server started successfully for user {}, database holds {} user(s)",
            self.user_id,
            users
        );

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    pub fn cache(&self) -> &TtlCache<Vec<HealthMetricRecord>> {
        &self.cache
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Fitbit token exchange client, present when Fitbit is configured
    pub fn fitbit(&self) -> Option<&FitbitClient> {
        self.fitbit.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

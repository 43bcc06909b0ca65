//! Environment configuration
//!
//! Read once at startup. A missing API key for the generative endpoint is
//! fatal; provider credentials are optional and only gate their tools.

use thiserror::Error;

use crate::assistant::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_ENV: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL_ENV: &str = "GEMINI_BASE_URL";
pub const FITBIT_CLIENT_ID_ENV: &str = "FITBIT_CLIENT_ID";
pub const FITBIT_CLIENT_SECRET_ENV: &str = "FITBIT_CLIENT_SECRET";
pub const GOOGLE_FIT_CLIENT_ID_ENV: &str = "GOOGLE_FIT_CLIENT_ID";
pub const OAUTH_REDIRECT_BASE_ENV: &str = "OAUTH_REDIRECT_BASE";

/// Default origin the OAuth callbacks redirect to
pub const DEFAULT_REDIRECT_BASE: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Fitbit app credentials
#[derive(Debug, Clone, PartialEq)]
pub struct FitbitCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub fitbit: Option<FitbitCredentials>,
    pub google_fit_client_id: Option<String>,
    pub redirect_base: String,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get(GEMINI_API_KEY_ENV).ok_or(ConfigError::MissingVar(GEMINI_API_KEY_ENV))?;

        let fitbit = get(FITBIT_CLIENT_ID_ENV).map(|client_id| FitbitCredentials {
            client_id,
            client_secret: get(FITBIT_CLIENT_SECRET_ENV),
        });

        Ok(Self {
            gemini_api_key,
            gemini_model: get(GEMINI_MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get(GEMINI_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fitbit,
            google_fit_client_id: get(GOOGLE_FIT_CLIENT_ID_ENV),
            redirect_base: get(OAUTH_REDIRECT_BASE_ENV)
                .unwrap_or_else(|| DEFAULT_REDIRECT_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Callback URL registered for a provider, e.g. `http://localhost:5173/auth/fitbit/callback`
    pub fn redirect_uri(&self, callback_path: &str) -> String {
        format!("{}/{}", self.redirect_base, callback_path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"[REDACTED]")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("fitbit", &self.fitbit.as_ref().map(|c| &c.client_id))
            .field("google_fit_client_id", &self.google_fit_client_id)
            .field("redirect_base", &self.redirect_base)
            .finish()
    }
}

//! Fitbit authorization-code flow

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{expiry_after, ProviderError, ProviderKind, ProviderToken};

pub const AUTHORIZE_URL: &str = "https://www.fitbit.com/oauth2/authorize";
pub const TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";

/// Requested token lifetime, one year
pub const TOKEN_LIFETIME_SECS: &str = "31536000";

pub const SCOPES: &[&str] = &[
    "activity",
    "heartrate",
    "location",
    "nutrition",
    "profile",
    "settings",
    "sleep",
    "weight",
];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Exchanges Fitbit authorization codes for tokens
pub struct FitbitClient {
    client_id: String,
    client_secret: Option<String>,
    token_url: String,
    client: Client,
}

impl FitbitClient {
    pub fn new(client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            token_url: TOKEN_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Form body sent to the token endpoint
    fn exchange_params<'a>(&'a self, code: &'a str, redirect_uri: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code", code),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        params
    }

    /// Exchange an authorization code for a token. Not retried.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<ProviderToken, ProviderError> {
        self.exchange_code_at(code, redirect_uri, Utc::now()).await
    }

    async fn exchange_code_at(
        &self,
        code: &str,
        redirect_uri: &str,
        now: DateTime<Utc>,
    ) -> Result<ProviderToken, ProviderError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&self.exchange_params(code, redirect_uri))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = first_error_message(&body).unwrap_or_else(|| "Failed to get access token".to_string());
            warn!(status = %status, "Fitbit token exchange failed: {}", message);
            return Err(ProviderError::TokenExchange(message));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::TokenExchange(format!("Malformed token response: {}", e)))?;

        let token = token_from_response(token, now)?;
        info!("Fitbit authentication successful");
        Ok(token)
    }
}

fn token_from_response(token: TokenResponse, now: DateTime<Utc>) -> Result<ProviderToken, ProviderError> {
    Ok(ProviderToken {
        provider: ProviderKind::Fitbit,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token.expires_in.map(|secs| expiry_after(now, secs)).transpose()?,
    })
}

fn first_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()?
        .errors
        .into_iter()
        .find_map(|e| e.message)
}

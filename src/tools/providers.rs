/// Tools for connecting fitness data providers
///
/// This module implements the provider_connect, provider_callback and
/// provider_status MCP tools.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::UserId;
use crate::providers::{authorization_url, parse_fragment_token, FitbitClient, ProviderError, ProviderKind};
use crate::storage::WellnessStorage;
use crate::tools::ToolError;

fn client_id(config: &Config, kind: ProviderKind) -> Option<&str> {
    match kind {
        ProviderKind::Fitbit => config.fitbit.as_ref().map(|c| c.client_id.as_str()),
        ProviderKind::GoogleFit => config.google_fit_client_id.as_deref(),
    }
}

/// Parameters for starting a provider connection
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConnectParams {
    /// fitbit or google_fit
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub message: String,
    pub authorize_url: String,
}

/// Build the authorize URL the user opens to grant access
pub fn connect_provider(config: &Config, params: ConnectParams) -> Result<ConnectResponse, ToolError> {
    let kind: ProviderKind = params.provider.parse()?;
    let client_id = client_id(config, kind).ok_or(ProviderError::NotConfigured(kind))?;
    let redirect_uri = config.redirect_uri(kind.callback_path());
    let authorize_url = authorization_url(kind, client_id, &redirect_uri)?;

    Ok(ConnectResponse {
        message: format!(
            "🔗 Open this link to connect {}:\n{}\n\nThen pass the callback {} to provider_callback.",
            kind,
            authorize_url,
            match kind {
                ProviderKind::Fitbit => "code",
                ProviderKind::GoogleFit => "URL fragment",
            }
        ),
        authorize_url,
    })
}

/// Parameters for finishing a provider connection
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallbackParams {
    /// fitbit or google_fit
    pub provider: String,
    /// Authorization code from the Fitbit callback
    pub code: Option<String>,
    /// URL fragment from the Google Fit callback, with or without the leading '#'
    pub fragment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub success: bool,
    pub message: String,
    pub provider: ProviderKind,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Turn a provider callback into a stored token
///
/// Fitbit codes are exchanged once against the token endpoint; a failure is
/// returned to the caller without retrying.
pub async fn complete_provider_callback<S: WellnessStorage>(
    storage: &S,
    config: &Config,
    fitbit: Option<&FitbitClient>,
    user_id: &UserId,
    params: CallbackParams,
) -> Result<CallbackResponse, ToolError> {
    let kind: ProviderKind = params.provider.parse()?;

    let token = match kind {
        ProviderKind::Fitbit => {
            let code = non_empty(params.code)
                .ok_or_else(|| ToolError::InvalidInput("code is required for Fitbit".to_string()))?;
            let client = fitbit.ok_or(ProviderError::NotConfigured(kind))?;
            client.exchange_code(&code, &config.redirect_uri(kind.callback_path())).await?
        }
        ProviderKind::GoogleFit => {
            let fragment = non_empty(params.fragment)
                .ok_or_else(|| ToolError::InvalidInput("fragment is required for Google Fit".to_string()))?;
            parse_fragment_token(&fragment, Utc::now())?
        }
    };

    storage.save_provider_token(user_id, &token)?;
    tracing::info!("Stored {} token for {}", kind, user_id);

    let message = match token.expires_at {
        Some(at) => format!("✅ Connected {}. Access expires {}", kind, at.format("%Y-%m-%d %H:%M UTC")),
        None => format!("✅ Connected {}", kind),
    };

    Ok(CallbackResponse {
        success: true,
        message,
        provider: kind,
        expires_at: token.expires_at,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parameters for the provider status tool (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    NotConfigured,
    NotConnected,
    Expired,
    Connected,
}

impl ConnectionState {
    pub fn describe(&self) -> &'static str {
        match self {
            ConnectionState::NotConfigured => "not configured",
            ConnectionState::NotConnected => "not connected",
            ConnectionState::Expired => "expired, reconnect needed",
            ConnectionState::Connected => "connected",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub providers: Vec<(ProviderKind, ConnectionState)>,
}

pub fn provider_status<S: WellnessStorage>(
    storage: &S,
    config: &Config,
    user_id: &UserId,
    _params: StatusParams,
) -> Result<StatusResponse, ToolError> {
    let now = Utc::now();
    let mut providers = Vec::with_capacity(ProviderKind::ALL.len());

    for kind in ProviderKind::ALL {
        let state = match storage.get_provider_token(user_id, kind)? {
            Some(token) if token.is_expired(now) => ConnectionState::Expired,
            Some(_) => ConnectionState::Connected,
            None if client_id(config, kind).is_none() => ConnectionState::NotConfigured,
            None => ConnectionState::NotConnected,
        };
        providers.push((kind, state));
    }

    let lines: Vec<String> = providers
        .iter()
        .map(|(kind, state)| format!("- {}: {}", kind, state.describe()))
        .collect();

    Ok(StatusResponse {
        message: format!("🔌 **Data Providers**\n{}", lines.join("\n")),
        providers,
    })
}

//! Third-party fitness providers connected over OAuth
//!
//! Only the authorization step is modelled here: building the authorize URL,
//! turning a callback into a [`ProviderToken`], and reporting whether the
//! stored token is still usable. Fetching provider data is out of scope.

pub mod fitbit;
pub mod google_fit;

pub use fitbit::FitbitClient;
pub use google_fit::parse_fragment_token;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider {0} is not configured")]
    NotConfigured(ProviderKind),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid callback: {0}")]
    InvalidCallback(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Fitbit,
    GoogleFit,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Fitbit, ProviderKind::GoogleFit];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Fitbit => "fitbit",
            ProviderKind::GoogleFit => "google_fit",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Fitbit => "Fitbit",
            ProviderKind::GoogleFit => "Google Fit",
        }
    }

    pub fn authorize_url(&self) -> &'static str {
        match self {
            ProviderKind::Fitbit => fitbit::AUTHORIZE_URL,
            ProviderKind::GoogleFit => google_fit::AUTHORIZE_URL,
        }
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::Fitbit => fitbit::SCOPES,
            ProviderKind::GoogleFit => google_fit::SCOPES,
        }
    }

    /// OAuth `response_type`: authorization code or implicit-grant token
    pub fn response_type(&self) -> &'static str {
        match self {
            ProviderKind::Fitbit => "code",
            ProviderKind::GoogleFit => "token",
        }
    }

    /// Path under the redirect base that the provider calls back to
    pub fn callback_path(&self) -> &'static str {
        match self {
            ProviderKind::Fitbit => "auth/fitbit/callback",
            ProviderKind::GoogleFit => "auth/google-fit/callback",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fitbit" => Ok(ProviderKind::Fitbit),
            "google_fit" | "googlefit" => Ok(ProviderKind::GoogleFit),
            _ => Err(ProviderError::UnknownProvider(s.to_string())),
        }
    }
}

/// Stored OAuth credentials for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderToken {
    pub provider: ProviderKind,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ProviderToken {
    /// A token without an expiry never expires
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Absolute expiry `expires_in` seconds after `now`
///
/// `expires_in` comes from outside the process, so out-of-range values are
/// rejected instead of overflowing.
pub fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>, ProviderError> {
    chrono::Duration::try_seconds(expires_in)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| ProviderError::InvalidCallback("expires_in out of range".to_string()))
}

/// Build the provider's authorize URL
pub fn authorization_url(kind: ProviderKind, client_id: &str, redirect_uri: &str) -> Result<String, ProviderError> {
    let mut url = url::Url::parse(kind.authorize_url())?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", kind.response_type())
            .append_pair("scope", &kind.scopes().join(" "));
        match kind {
            ProviderKind::Fitbit => {
                query.append_pair("expires_in", fitbit::TOKEN_LIFETIME_SECS);
            }
            ProviderKind::GoogleFit => {
                query
                    .append_pair("include_granted_scopes", "true")
                    .append_pair("access_type", "offline");
            }
        }
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;

    fn query_of(url: &str) -> HashMap<String, String> {
        url::Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    #[test]
    fn test_fitbit_authorize_url() {
        let url = authorization_url(ProviderKind::Fitbit, "abc", "http://localhost:5173/auth/fitbit/callback").unwrap();
        assert!(url.starts_with("https://www.fitbit.com/oauth2/authorize?"));

        let query = query_of(&url);
        assert_eq!(query["client_id"], "abc");
        assert_eq!(query["redirect_uri"], "http://localhost:5173/auth/fitbit/callback");
        assert_eq!(query["response_type"], "code");
        assert_eq!(
            query["scope"],
            "activity heartrate location nutrition profile settings sleep weight"
        );
        assert_eq!(query["expires_in"], "31536000");
    }

    #[test]
    fn test_google_fit_authorize_url() {
        let url = authorization_url(ProviderKind::GoogleFit, "gid", "http://localhost/cb").unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));

        let query = query_of(&url);
        assert_eq!(query["client_id"], "gid");
        assert_eq!(query["response_type"], "token");
        assert_eq!(query["include_granted_scopes"], "true");
        assert_eq!(query["access_type"], "offline");
        assert!(query["scope"].contains("https://www.googleapis.com/auth/fitness.sleep.read profile email"));
        assert!(!query.contains_key("expires_in"));
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("fitbit".parse::<ProviderKind>().unwrap(), ProviderKind::Fitbit);
        assert_eq!("google-fit".parse::<ProviderKind>().unwrap(), ProviderKind::GoogleFit);
        assert!("strava".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_token_expiry() {
        let now = Utc::now();
        let token = ProviderToken {
            provider: ProviderKind::Fitbit,
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(now + Duration::hours(1)),
        };
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::hours(2)));

        let forever = ProviderToken { expires_at: None, ..token };
        assert!(!forever.is_expired(now + Duration::days(3650)));
    }

    #[test]
    fn test_expiry_after_rejects_overflow() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 60).unwrap(), now + Duration::seconds(60));
        assert!(matches!(expiry_after(now, i64::MAX), Err(ProviderError::InvalidCallback(_))));
        assert!(matches!(expiry_after(now, 9_000_000_000_000), Err(ProviderError::InvalidCallback(_))));
    }
}

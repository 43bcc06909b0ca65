//! Google Fit implicit-grant flow

use chrono::{DateTime, Utc};

use super::{expiry_after, ProviderError, ProviderKind, ProviderToken};

pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/fitness.activity.read",
    "https://www.googleapis.com/auth/fitness.heart_rate.read",
    "https://www.googleapis.com/auth/fitness.sleep.read",
    "profile",
    "email",
];

/// Turn the callback URL fragment (`access_token=...&expires_in=...`) into a token
///
/// A leading `#` is accepted. `expires_in` is optional; when present it is
/// added to `now` and must not overflow the timestamp range.
pub fn parse_fragment_token(fragment: &str, now: DateTime<Utc>) -> Result<ProviderToken, ProviderError> {
    let fragment = fragment.trim().trim_start_matches('#');

    let mut access_token = None;
    let mut expires_in = None;
    let mut refresh_token = None;
    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
            "refresh_token" if !value.is_empty() => refresh_token = Some(value.into_owned()),
            "expires_in" => {
                let secs = value
                    .parse::<i64>()
                    .map_err(|_| ProviderError::InvalidCallback(format!("Invalid expires_in '{}'", value)))?;
                expires_in = Some(secs);
            }
            _ => {}
        }
    }

    let access_token =
        access_token.ok_or_else(|| ProviderError::InvalidCallback("No access token received".to_string()))?;

    Ok(ProviderToken {
        provider: ProviderKind::GoogleFit,
        access_token,
        refresh_token,
        expires_at: expires_in.map(|secs| expiry_after(now, secs)).transpose()?,
    })
}

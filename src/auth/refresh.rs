// Token refresh call

use reqwest::{header, Client, Url};
use serde_json::Value;

use super::types::{RefreshOutcome, RefreshRequest};
use crate::error::Result;

/// Default refresh endpoint, relative to the API base URL
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Exchange a refresh credential for a new access credential.
///
/// Only transport failures and a 2xx body that is not JSON are errors;
/// every HTTP-level answer is reported through [`RefreshOutcome`].
pub async fn refresh_access_token(
    client: &Client,
    url: &Url,
    refresh_token: &str,
) -> Result<RefreshOutcome> {
    tracing::debug!(url = %url, "Requesting new access token");

    let response = client
        .post(url.clone())
        .header(header::CONTENT_TYPE, "application/json")
        .json(&RefreshRequest { refresh_token })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = %status, "Refresh token rejected");
        return Ok(RefreshOutcome::Rejected(status.as_u16()));
    }

    let data: Value = response.json().await?;

    // Any body shape without a non-empty string accessToken counts as missing
    match data.get("accessToken").and_then(Value::as_str) {
        Some(token) if !token.is_empty() => {
            tracing::info!("Access token refreshed ({}...)", token_prefix(token));
            Ok(RefreshOutcome::Renewed(token.to_string()))
        }
        _ => {
            tracing::debug!("Refresh response does not contain accessToken");
            Ok(RefreshOutcome::Missing)
        }
    }
}

/// First characters of a token, safe to put in logs
pub(crate) fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

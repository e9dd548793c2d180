// Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Refresh endpoint request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Result of a call to the refresh endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// 2xx with a usable access token
    Renewed(String),

    /// 2xx but no `accessToken` in the body
    Missing,

    /// Non-2xx status, the refresh credential is no longer accepted
    Rejected(u16),
}

/// Claims carried by access and refresh tokens issued by the auth server.
/// Every field is optional; unknown claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,

    /// Expiry as seconds since the Unix epoch
    pub exp: Option<i64>,
}

impl SessionClaims {
    /// Expiry as a timestamp, if the token carries a representable one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether the token is expired at `now`. Tokens without `exp` never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

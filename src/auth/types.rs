//! Credential types
//!
//! Records returned by the token endpoints. Timestamps must carry an
//! explicit zone; anything else is rejected instead of being dropped.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-side token status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStatus {
    Active,
    Expired,
    Revoked,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TokenStatus {
    pub fn is_active(self) -> bool {
        self == TokenStatus::Active
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenStatus::Active => "ACTIVE",
            TokenStatus::Expired => "EXPIRED",
            TokenStatus::Revoked => "REVOKED",
            TokenStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Long-lived token used to mint access tokens
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    #[serde(default)]
    pub refresh_token: String,
    pub user_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "iso8601")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "expires_at", with = "iso8601")]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default, with = "iso8601")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_status: TokenStatus,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Short-lived token sent in the `Token` header
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub api_access_token: String,
    pub user_id: i64,
    #[serde(default, with = "iso8601")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "expires_at", with = "iso8601")]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub token_status: TokenStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tokens this close to expiry are treated as expired
const EXPIRY_SKEW_SECS: i64 = 30;

fn is_past(expires_at: Option<DateTime<Utc>>) -> bool {
    expires_at.is_some_and(|at| at <= Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECS))
}

impl AccessToken {
    /// True when the server reports the token active and it is not about
    /// to expire
    pub fn is_usable(&self) -> bool {
        self.token_status.is_active() && !is_past(self.token_expires_at)
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshToken")
            .field("refresh_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("token_expires_at", &self.token_expires_at)
            .field("token_status", &self.token_status)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("api_access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("token_expires_at", &self.token_expires_at)
            .field("token_status", &self.token_status)
            .finish_non_exhaustive()
    }
}

/// The credential the authenticator currently holds
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    Refresh(RefreshToken),
    Access(AccessToken),
}

impl Credential {
    pub fn user_id(&self) -> i64 {
        match self {
            Credential::Refresh(t) => t.user_id,
            Credential::Access(t) => t.user_id,
        }
    }

    pub fn status(&self) -> TokenStatus {
        match self {
            Credential::Refresh(t) => t.token_status,
            Credential::Access(t) => t.token_status,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Credential::Refresh(t) => t.created_at,
            Credential::Access(t) => t.created_at,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Credential::Refresh(t) => t.token_expires_at,
            Credential::Access(t) => t.token_expires_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Past its expiry, or within 30 seconds of it
    pub fn is_expired(&self) -> bool {
        self.status() == TokenStatus::Expired || is_past(self.expires_at())
    }
}

/// Parse an ISO-8601 timestamp with an explicit offset or `Z` suffix
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Timestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Serde adapter for optional zoned timestamps
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_timestamp(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

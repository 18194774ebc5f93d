use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer credential as held in memory and persisted to the token cache.
///
/// A token with no expiry never triggers a refresh; a token whose expiry is
/// not strictly in the future must never be served without refreshing first.
/// `id_token` carries the identity assertion when the upstream exchange
/// returned one, so an identity-rendering view can share the same entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl AccessToken {
    pub fn new(access_token: String, expiry: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_owned(),
            refresh_token: None,
            expiry,
            id_token: None,
        }
    }

    /// Strict freshness predicate: `expiry > now`. A token expiring exactly
    /// now is already stale. Absent expiry means the token never expires.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry > now,
            None => true,
        }
    }

    /// Effective bearer string for the requested render mode.
    pub fn bearer(&self, identity: bool) -> &str {
        if identity {
            self.id_token.as_deref().unwrap_or_default()
        } else {
            &self.access_token
        }
    }

    /// Copy of the token with the render mode applied to `access_token`.
    pub fn rendered(&self, identity: bool) -> AccessToken {
        let mut tok = self.clone();
        if identity {
            tok.access_token = self.bearer(true).to_owned();
        }
        tok
    }
}

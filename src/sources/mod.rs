/// Sources module
///
/// Defines all supported token producers behind a single tagged-variant
/// dispatch type. Every producer exposes `fetch_token()` and a cheap,
/// stable `cache_key()`; the caching layer stays fully decoupled from
/// which variant it wraps.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

pub mod identity;
pub mod impersonate;
pub mod metadata;
pub mod service_account;
pub mod user;

use identity::IdentitySource;
use impersonate::ImpersonatedSource;
use metadata::MetadataSource;
use service_account::ServiceAccountSource;
use user::UserSource;

use crate::cache::token::AccessToken;
use crate::credentials::{ApplicationCredentials, CredentialKind};
use crate::errors::{BrokerError, Result};
use crate::utils::constants::DEFAULT_HTTP_TIMEOUT_MS;

#[derive(Debug, Clone)]
pub enum SourceKind {
    User(UserSource),
    ServiceAccount(ServiceAccountSource),
    Metadata(MetadataSource),
    Impersonated(ImpersonatedSource),
    Identity(IdentitySource),
    #[cfg(test)]
    Static(testing::StaticSource),
}

impl SourceKind {
    pub fn cache_key(&self) -> String {
        match self {
            SourceKind::User(s) => s.cache_key(),
            SourceKind::ServiceAccount(s) => s.cache_key(),
            SourceKind::Metadata(s) => s.cache_key(),
            SourceKind::Impersonated(s) => s.cache_key(),
            SourceKind::Identity(s) => s.cache_key(),
            #[cfg(test)]
            SourceKind::Static(s) => s.cache_key(),
        }
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        match self {
            SourceKind::User(s) => s.fetch_token().await,
            SourceKind::ServiceAccount(s) => s.fetch_token().await,
            SourceKind::Metadata(s) => s.fetch_token().await,
            SourceKind::Impersonated(s) => s.fetch_token().await,
            SourceKind::Identity(s) => s.fetch_token().await,
            #[cfg(test)]
            SourceKind::Static(s) => s.fetch_token(),
        }
    }
}

/// Build the producer matching the descriptor shape. An unrecognized
/// `type` is a descriptor problem, so resolution can fall through on it.
pub fn build_source(creds: ApplicationCredentials) -> Result<SourceKind> {
    match creds.kind() {
        Some(CredentialKind::AuthorizedUser) => Ok(SourceKind::User(UserSource::new(&creds))),
        Some(CredentialKind::ServiceAccount) => {
            Ok(SourceKind::ServiceAccount(ServiceAccountSource::new(&creds)))
        }
        None => Err(BrokerError::descriptor(anyhow::anyhow!(
            "unknown credential type '{}'",
            creds.credential_type
        ))),
    }
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Standard OAuth2 token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

impl TokenEndpointResponse {
    pub fn into_access_token(self, now: DateTime<Utc>) -> AccessToken {
        AccessToken {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            id_token: self.id_token,
        }
    }
}

/// Read the `exp` claim out of a JWT payload without verifying it. The
/// token came over an authenticated channel; only the expiry matters here.
pub(crate) fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: i64,
    }
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::cache::token::AccessToken;
    use crate::errors::{BrokerError, Result};

    /// Canned producer that counts invocations, for exercising the caching
    /// layer without a network.
    #[derive(Debug, Clone)]
    pub struct StaticSource {
        pub key: String,
        pub token: AccessToken,
        pub fail: bool,
        pub calls: Arc<AtomicUsize>,
    }

    impl StaticSource {
        pub fn new(key: &str, token: AccessToken) -> Self {
            Self {
                key: key.to_owned(),
                token,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(key: &str) -> Self {
            let mut src = Self::new(key, AccessToken::new(String::new(), None));
            src.fail = true;
            src
        }

        pub fn cache_key(&self) -> String {
            self.key.clone()
        }

        pub fn fetch_token(&self) -> Result<AccessToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BrokerError::refresh(anyhow::anyhow!("static source failure")));
            }
            Ok(self.token.clone())
        }
    }
}

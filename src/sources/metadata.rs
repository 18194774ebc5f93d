use anyhow::anyhow;
use chrono::Utc;
use reqwest::Client;

use crate::cache::token::AccessToken;
use crate::errors::{BrokerError, Result};
use crate::sources::{http_client, jwt_expiry, TokenEndpointResponse};
use crate::utils::constants::{DEFAULT_METADATA_HOST, ENV_METADATA_HOST, METADATA_CACHE_KEY};

/// Ambient identity from the host metadata service. Used only when no
/// on-disk descriptor is present.
#[derive(Debug, Clone)]
pub struct MetadataSource {
    base: String,
    client: Client,
}

impl MetadataSource {
    pub fn new() -> Self {
        let base = match std::env::var(ENV_METADATA_HOST) {
            Ok(host) if !host.is_empty() => {
                if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("http://{host}")
                }
            }
            _ => DEFAULT_METADATA_HOST.to_owned(),
        };
        Self::with_base(base)
    }

    pub fn with_base(base: String) -> Self {
        Self {
            base,
            client: http_client(),
        }
    }

    pub fn cache_key(&self) -> String {
        METADATA_CACHE_KEY.to_owned()
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.base
        );
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(BrokerError::refresh)?;
        if !response.status().is_success() {
            return Err(BrokerError::refresh(anyhow!(
                "metadata token request failed: {}",
                response.status()
            )));
        }
        let body: TokenEndpointResponse =
            response.json().await.map_err(BrokerError::refresh)?;
        Ok(body.into_access_token(Utc::now()))
    }

    /// The metadata identity endpoint returns the id token as a bare JWT.
    pub async fn fetch_identity_token(&self, audience: &str) -> Result<AccessToken> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/identity",
            self.base
        );
        let response = self
            .client
            .get(&url)
            .query(&[("audience", audience), ("format", "full")])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(BrokerError::refresh)?;
        if !response.status().is_success() {
            return Err(BrokerError::refresh(anyhow!(
                "metadata identity request failed: {}",
                response.status()
            )));
        }
        let id_token = response.text().await.map_err(BrokerError::refresh)?;
        let id_token = id_token.trim().to_owned();
        let mut tok = AccessToken::new(id_token.clone(), jwt_expiry(&id_token));
        tok.id_token = Some(id_token);
        Ok(tok)
    }
}

impl Default for MetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

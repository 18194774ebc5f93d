use anyhow::anyhow;
use chrono::Utc;
use reqwest::Client;

use crate::cache::token::AccessToken;
use crate::credentials::ApplicationCredentials;
use crate::errors::{BrokerError, Result};
use crate::sources::{http_client, TokenEndpointResponse};
use crate::utils::constants::DEFAULT_TOKEN_URI;

/// Exchanges a stored user refresh token for an access token.
///
/// A revoked or expired refresh token surfaces as `Refresh` so the caller
/// can fall back to re-authentication; nothing is retried here.
#[derive(Debug, Clone)]
pub struct UserSource {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: String,
    cache_key: String,
    client: Client,
}

impl UserSource {
    pub fn new(creds: &ApplicationCredentials) -> Self {
        let token_uri = if creds.token_uri.is_empty() {
            DEFAULT_TOKEN_URI.to_owned()
        } else {
            creds.token_uri.clone()
        };
        Self {
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            refresh_token: creds.refresh_token.clone(),
            token_uri,
            cache_key: creds.cache_key(),
            client: http_client(),
        }
    }

    pub fn cache_key(&self) -> String {
        self.cache_key.clone()
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .client
            .post(&self.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(BrokerError::refresh)?;
        if !response.status().is_success() {
            return Err(BrokerError::refresh(anyhow!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let body: TokenEndpointResponse =
            response.json().await.map_err(BrokerError::refresh)?;
        Ok(body.into_access_token(Utc::now()))
    }
}

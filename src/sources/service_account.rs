use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;

use crate::cache::token::AccessToken;
use crate::credentials::ApplicationCredentials;
use crate::errors::{BrokerError, Result};
use crate::sources::{http_client, jwt_expiry, TokenEndpointResponse};
use crate::utils::constants::{CLOUD_PLATFORM_SCOPE, DEFAULT_TOKEN_URI, JWT_BEARER_GRANT};

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_audience: Option<&'a str>,
}

/// Exchanges a signed service-account assertion for an access token.
/// Malformed key material and endpoint rejections surface as `Refresh`.
#[derive(Debug, Clone)]
pub struct ServiceAccountSource {
    pub client_email: String,
    pub private_key_id: String,
    private_key: String,
    pub token_uri: String,
    client: Client,
}

impl ServiceAccountSource {
    pub fn new(creds: &ApplicationCredentials) -> Self {
        let token_uri = if creds.token_uri.is_empty() {
            DEFAULT_TOKEN_URI.to_owned()
        } else {
            creds.token_uri.clone()
        };
        Self {
            client_email: creds.client_email.clone(),
            private_key_id: creds.private_key_id.clone(),
            private_key: creds.private_key.clone(),
            token_uri,
            client: http_client(),
        }
    }

    pub fn cache_key(&self) -> String {
        self.client_email.clone()
    }

    fn assertion(&self, scope: Option<&str>, target_audience: Option<&str>) -> Result<String> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(BrokerError::refresh)?;
        let mut header = Header::new(Algorithm::RS256);
        if !self.private_key_id.is_empty() {
            header.kid = Some(self.private_key_id.clone());
        }
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            aud: &self.token_uri,
            iat,
            exp: iat + 3600,
            scope,
            target_audience,
        };
        jsonwebtoken::encode(&header, &claims, &key).map_err(BrokerError::refresh)
    }

    async fn exchange(&self, assertion: String) -> Result<TokenEndpointResponse> {
        let form = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
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
        response.json().await.map_err(BrokerError::refresh)
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        let assertion = self.assertion(Some(CLOUD_PLATFORM_SCOPE), None)?;
        let body = self.exchange(assertion).await?;
        Ok(body.into_access_token(Utc::now()))
    }

    /// Audience-scoped identity assertion: the exchange returns an
    /// `id_token` whose expiry is carried in its own `exp` claim.
    pub async fn fetch_identity_token(&self, audience: &str) -> Result<AccessToken> {
        let assertion = self.assertion(None, Some(audience))?;
        let body = self.exchange(assertion).await?;
        let id_token = body
            .id_token
            .ok_or_else(|| BrokerError::refresh(anyhow!("token endpoint returned no id_token")))?;
        let mut tok = AccessToken::new(id_token.clone(), jwt_expiry(&id_token));
        tok.id_token = Some(id_token);
        Ok(tok)
    }
}

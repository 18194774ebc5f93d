use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::cache::token::AccessToken;
use crate::errors::{BrokerError, Result};
use crate::sources::{http_client, SourceKind};
use crate::utils::constants::{CLOUD_PLATFORM_SCOPE, DEFAULT_IAM_CREDENTIALS_BASE};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    access_token: String,
    expire_time: DateTime<Utc>,
}

/// Exchanges the parent producer's token for a short-lived token acting as
/// the target principal.
///
/// The cache key is the target principal itself, never derived from the
/// parent, so impersonated tokens cannot collide with the parent's entry.
#[derive(Debug, Clone)]
pub struct ImpersonatedSource {
    pub target_principal: String,
    parent: Box<SourceKind>,
    base: String,
    client: Client,
}

impl ImpersonatedSource {
    pub fn new(target_principal: String, parent: Box<SourceKind>) -> Self {
        Self::with_base(target_principal, parent, DEFAULT_IAM_CREDENTIALS_BASE.to_owned())
    }

    pub fn with_base(target_principal: String, parent: Box<SourceKind>, base: String) -> Self {
        Self {
            target_principal,
            parent,
            base,
            client: http_client(),
        }
    }

    pub fn cache_key(&self) -> String {
        self.target_principal.clone()
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        // boxed to break the async recursion through SourceKind; a Send
        // bound here would make the auto-trait inference cyclic
        let parent_fut: Pin<Box<dyn Future<Output = Result<AccessToken>> + '_>> =
            Box::pin(self.parent.fetch_token());
        let parent_tok = parent_fut.await?;

        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{}:generateAccessToken",
            self.base, self.target_principal
        );
        let body = serde_json::json!({
            "scope": [CLOUD_PLATFORM_SCOPE],
            "lifetime": "3600s",
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&parent_tok.access_token)
            .json(&body)
            .send()
            .await
            .map_err(BrokerError::refresh)?;
        if !response.status().is_success() {
            return Err(BrokerError::refresh(anyhow!(
                "unable to impersonate {}: {}",
                self.target_principal,
                response.status()
            )));
        }
        let body: GenerateAccessTokenResponse =
            response.json().await.map_err(BrokerError::refresh)?;
        Ok(AccessToken::new(body.access_token, Some(body.expire_time)))
    }
}

use crate::cache::token::AccessToken;
use crate::errors::Result;
use crate::sources::metadata::MetadataSource;
use crate::sources::service_account::ServiceAccountSource;

/// Which origin backs the audience-scoped identity token. User-shape
/// credentials cannot produce one; resolution rejects them up front with
/// an explicit unsupported error instead of a wrong-but-present token.
#[derive(Debug, Clone)]
pub enum IdentityBackend {
    ServiceAccount(ServiceAccountSource),
    Metadata(MetadataSource),
}

/// Produces identity assertions for a specific audience.
#[derive(Debug, Clone)]
pub struct IdentitySource {
    pub audience: String,
    cache_key: String,
    backend: IdentityBackend,
}

impl IdentitySource {
    /// The cache key is `audience + "-" + upstream key` so identical
    /// principals asked for different audiences never share an entry.
    pub fn new(audience: String, upstream_cache_key: &str, backend: IdentityBackend) -> Self {
        let cache_key = format!("{audience}-{upstream_cache_key}");
        Self {
            audience,
            cache_key,
            backend,
        }
    }

    pub fn cache_key(&self) -> String {
        self.cache_key.clone()
    }

    pub async fn fetch_token(&self) -> Result<AccessToken> {
        match &self.backend {
            IdentityBackend::ServiceAccount(sa) => sa.fetch_identity_token(&self.audience).await,
            IdentityBackend::Metadata(md) => md.fetch_identity_token(&self.audience).await,
        }
    }
}

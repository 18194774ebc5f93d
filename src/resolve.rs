//! Resolution policy: decides which producer chain backs a token request.
//!
//! Precedence is explicit credentials over ambient identity, with
//! impersonation always layered last so it composes with either origin.
//! All configuration is threaded through [`ResolveOptions`]; there is no
//! process-wide mutable state.

use std::env;
use std::path::PathBuf;

use crate::cache::token_cache::CachingTokenSource;
use crate::credentials::{CredentialKind, CredentialStore};
use crate::errors::{BrokerError, Result};
use crate::helpers::paths::token_cache_dir;
use crate::sources::identity::{IdentityBackend, IdentitySource};
use crate::sources::impersonate::ImpersonatedSource;
use crate::sources::metadata::MetadataSource;
use crate::sources::service_account::ServiceAccountSource;
use crate::sources::{build_source, SourceKind};
use crate::utils::constants::{ENV_IMPERSONATE_SERVICE_ACCOUNT, METADATA_CACHE_KEY};

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Target principal from the command line; the
    /// `GOOGLE_IMPERSONATE_SERVICE_ACCOUNT` environment override wins.
    pub impersonate_target: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl ResolveOptions {
    pub fn impersonate_target(&self) -> Option<String> {
        match env::var(ENV_IMPERSONATE_SERVICE_ACCOUNT) {
            Ok(email) if !email.is_empty() => Some(email),
            _ => self
                .impersonate_target
                .clone()
                .filter(|email| !email.is_empty()),
        }
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(token_cache_dir)
    }
}

/// Build the caching access-token chain for these options.
pub fn resolve(opts: &ResolveOptions) -> Result<CachingTokenSource> {
    let mut source = main_source(opts);
    if let Some(target) = opts.impersonate_target() {
        source = SourceKind::Impersonated(ImpersonatedSource::new(target, Box::new(source)));
    }
    CachingTokenSource::new(source, opts.cache_dir())
}

/// Stored credentials win; any read, parse, or shape failure falls through
/// to the host metadata identity without surfacing.
fn main_source(opts: &ResolveOptions) -> SourceKind {
    let store = CredentialStore::discover(opts.credentials_path.as_deref());
    store
        .read()
        .and_then(build_source)
        .unwrap_or_else(|_| SourceKind::Metadata(MetadataSource::new()))
}

/// Build the caching chain for an audience-scoped identity token. Only
/// service-account and metadata origins can mint one; user credentials are
/// rejected explicitly rather than silently degraded.
pub fn resolve_identity(audience: &str, opts: &ResolveOptions) -> Result<CachingTokenSource> {
    let store = CredentialStore::discover(opts.credentials_path.as_deref());
    let source = match store.read().map(|creds| (creds.kind(), creds)) {
        Ok((Some(CredentialKind::ServiceAccount), creds)) => IdentitySource::new(
            audience.to_owned(),
            &creds.cache_key(),
            IdentityBackend::ServiceAccount(ServiceAccountSource::new(&creds)),
        ),
        Ok((Some(CredentialKind::AuthorizedUser), _)) => {
            return Err(BrokerError::Unsupported {
                kind: "authorized_user",
                operation: "audience-scoped identity token",
            })
        }
        // unreadable or unrecognized descriptor: same fallthrough as resolve()
        Ok((None, _)) | Err(_) => IdentitySource::new(
            audience.to_owned(),
            METADATA_CACHE_KEY,
            IdentityBackend::Metadata(MetadataSource::new()),
        ),
    };
    CachingTokenSource::new(SourceKind::Identity(source), opts.cache_dir())
}

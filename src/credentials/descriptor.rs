use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::utils::constants::{TYPE_AUTHORIZED_USER, TYPE_SERVICE_ACCOUNT};

/// Which refresh strategy a descriptor maps to, discriminated by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    AuthorizedUser,
    ServiceAccount,
}

/// The provider's canonical `application_default_credentials.json` format.
/// Exactly one of the user or service-account field groups is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationCredentials {
    // user account fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quota_project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_uri: String,

    // service account fields
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_email: String,

    // content hash of the raw descriptor bytes, set when read from disk
    #[serde(skip)]
    hash: String,
}

impl ApplicationCredentials {
    pub fn kind(&self) -> Option<CredentialKind> {
        match self.credential_type.as_str() {
            TYPE_AUTHORIZED_USER => Some(CredentialKind::AuthorizedUser),
            TYPE_SERVICE_ACCOUNT => Some(CredentialKind::ServiceAccount),
            _ => None,
        }
    }

    /// Stable identity string for the token cache. The account email is the
    /// explicit identity where present; user-shape descriptors carry no
    /// email, so the content hash stands in. It is stable across re-reads
    /// of byte-identical files and distinct for distinct credentials.
    pub fn cache_key(&self) -> String {
        if !self.client_email.is_empty() {
            return self.client_email.clone();
        }
        self.hash.clone()
    }

    pub(crate) fn set_hash(&mut self, raw: &[u8]) {
        let mut hasher = Sha1::new();
        hasher.update(raw);
        self.hash = hex::encode(hasher.finalize());
    }
}

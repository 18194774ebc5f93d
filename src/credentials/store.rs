use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::credentials::descriptor::ApplicationCredentials;
use crate::errors::{BrokerError, Result};
use crate::helpers::fs::write_atomic;
use crate::helpers::paths::credentials_path;

/// Reads and writes the canonical on-disk credential descriptor.
///
/// Reads fail with `BrokerError::Descriptor`, which resolution treats as
/// "no stored credentials" and falls through; writes use the same atomic
/// replace protocol as the token cache.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn discover(override_path: Option<&Path>) -> Self {
        Self {
            path: credentials_path(override_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<ApplicationCredentials> {
        let raw = fs::read(&self.path)
            .with_context(|| format!("unable to read {}", self.path.display()))
            .map_err(BrokerError::Descriptor)?;
        let mut creds: ApplicationCredentials = serde_json::from_slice(&raw)
            .with_context(|| format!("unable to decode {}", self.path.display()))
            .map_err(BrokerError::Descriptor)?;
        creds.set_hash(&raw);
        Ok(creds)
    }

    /// Idempotently persist the descriptor with atomic replace semantics.
    pub fn write(&self, creds: &ApplicationCredentials) -> Result<()> {
        let bytes = serde_json::to_vec(creds)
            .map_err(|e| BrokerError::CacheIo(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        write_atomic(&self.path, &bytes).map_err(BrokerError::CacheIo)
    }
}

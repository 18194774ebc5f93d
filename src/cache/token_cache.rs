use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::cache::token::AccessToken;
use crate::errors::{BrokerError, Result};
use crate::helpers::fs::write_atomic;
use crate::sources::SourceKind;

/// Injective file-name encoding of a cache key. Audience-scoped keys are
/// URLs whose slashes would otherwise be read as path separators, so every
/// byte outside a conservative set is percent-encoded. Email and sentinel
/// keys pass through unchanged.
pub(crate) fn cache_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'@' => {
                out.push(byte as char);
            }
            other => {
                out.push('%');
                out.push_str(&format!("{other:02X}"));
            }
        }
    }
    out
}

/// Decorates a token producer with a disk-backed, expiry-aware cache.
///
/// The in-memory token is a weak cache of the on-disk state and is always
/// re-validated against its expiry before use. The lock is process-local;
/// cross-process safety comes entirely from the atomic temp-then-rename
/// persistence: racing writers may overwrite each other, but a reader
/// always observes a complete entry.
#[derive(Debug, Clone)]
pub struct CachingTokenSource {
    source: SourceKind,
    cache_dir: PathBuf,
    tok: Arc<Mutex<Option<AccessToken>>>,
    render_identity: bool,
}

impl CachingTokenSource {
    pub fn new(source: SourceKind, cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir).map_err(BrokerError::CacheIo)?;
        Ok(Self {
            source,
            cache_dir,
            tok: Arc::new(Mutex::new(None)),
            render_identity: false,
        })
    }

    pub fn cache_key(&self) -> String {
        self.source.cache_key()
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", cache_file_name(&self.cache_key())))
    }

    /// Path of the raw bearer-token file, written alongside the JSON entry
    /// so a delegated process can be pointed at a file instead of being
    /// handed the secret on its command line.
    pub fn access_token_path(&self) -> PathBuf {
        self.cache_dir.join(cache_file_name(&self.cache_key()))
    }

    /// Read-only sibling that renders the identity assertion as the
    /// effective bearer string. It shares this source's lock and in-memory
    /// and on-disk state; the original is never mutated.
    pub fn identity_view(&self) -> CachingTokenSource {
        CachingTokenSource {
            source: self.source.clone(),
            cache_dir: self.cache_dir.clone(),
            tok: Arc::clone(&self.tok),
            render_identity: true,
        }
    }

    /// Serve a fresh token from memory or disk, refreshing through the
    /// wrapped producer exactly when needed. Exactly one producer call per
    /// invocation that needs a refresh; no stale token is ever substituted
    /// for an error.
    pub async fn token(&self) -> Result<AccessToken> {
        let mut guard = self.tok.lock().await;

        if guard.is_none() {
            *guard = self.token_from_disk().await;
        }
        if let Some(tok) = guard.as_ref() {
            if tok.is_fresh(Utc::now()) {
                return Ok(tok.rendered(self.render_identity));
            }
        }

        let fresh = self.source.fetch_token().await?;
        self.token_to_disk(&fresh)?;
        let rendered = fresh.rendered(self.render_identity);
        *guard = Some(fresh);
        Ok(rendered)
    }

    /// Absence of the entry means `Empty`; an unreadable or corrupt entry
    /// is treated the same and simply triggers a refresh.
    async fn token_from_disk(&self) -> Option<AccessToken> {
        let bytes = tokio::fs::read(self.cache_path()).await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn token_to_disk(&self, tok: &AccessToken) -> Result<()> {
        let bytes = serde_json::to_vec(tok).map_err(|e| {
            BrokerError::CacheIo(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        write_atomic(&self.cache_path(), &bytes).map_err(BrokerError::CacheIo)?;
        // raw bearer string for the fallback invoker, no trailing newline
        write_atomic(&self.access_token_path(), tok.access_token.as_bytes())
            .map_err(BrokerError::CacheIo)?;
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

//! # Token Broker Library
//!
//! Local credential broker in front of a cloud provider's OAuth2 token
//! endpoints and a legacy command-line tool. Resolves a layered set of
//! credential origins into valid access tokens, caches them durably
//! across process invocations, and refreshes them exactly when needed.
//!
//! Modules:
//! - `credentials` — the canonical on-disk credential descriptor and store
//! - `sources` — user, service-account, metadata, impersonation and
//!   identity token producers
//! - `cache` — the disk-backed, expiry-aware caching token source
//! - `resolve` — the policy choosing which producer chain to build
//! - `fallback` — delegation to the legacy CLI via a shared token file

pub mod cache;
pub mod cli;
pub mod credentials;
pub mod errors;
pub mod fallback;
pub mod helpers;
pub mod resolve;
pub mod sources;
pub mod tests;
pub mod utils;

pub use crate::cache::{AccessToken, CachingTokenSource};
pub use crate::errors::BrokerError;
pub use crate::resolve::{resolve, resolve_identity, ResolveOptions};

use thiserror::Error;

pub type Result<T, E = BrokerError> = std::result::Result<T, E>;

/// Error taxonomy for the token resolution and caching core.
///
/// `Descriptor` is recoverable: resolution falls through to the ambient
/// metadata identity instead of surfacing it. Everything else is fatal to
/// the current call and propagates to the command layer for presentation.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("unable to read application credentials, maybe you need to login: {0}")]
    Descriptor(#[source] anyhow::Error),

    #[error("unable to refresh token: {0}")]
    Refresh(#[source] anyhow::Error),

    #[error("token cache i/o failed: {0}")]
    CacheIo(#[source] std::io::Error),

    #[error("{operation} is not supported for {kind} credentials")]
    Unsupported {
        kind: &'static str,
        operation: &'static str,
    },
}

impl BrokerError {
    pub fn descriptor(err: impl Into<anyhow::Error>) -> Self {
        Self::Descriptor(err.into())
    }

    pub fn refresh(err: impl Into<anyhow::Error>) -> Self {
        Self::Refresh(err.into())
    }
}
